use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

fn fixture(name: &str) -> Vec<u8> {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read(path).unwrap()
}

fn bench_assemble_mixed(c: &mut Criterion) {
    let raw = fixture("mixed.eml");

    c.bench_function("assemble_mixed_eml", |b| {
        b.iter(|| mailsift::assemble::assemble_bytes(1, &raw).unwrap())
    });
}

fn bench_extract_tree(c: &mut Criterion) {
    let raw = fixture("mixed.eml");
    let message = mailsift::parser::mime::parse_message(&raw).unwrap();
    let root = mailsift::parser::mime::mime_tree(&message);

    c.bench_function("extract_mixed_tree", |b| {
        b.iter(|| mailsift::extract::extract_content(&root, Some("<mix-1@example.com>")).unwrap())
    });
}

fn bench_split_inbox(c: &mut Criterion) {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("inbox.mbox");

    c.bench_function("split_inbox_mbox", |b| {
        b.iter(|| {
            let mut count = 0u64;
            mailsift::parser::mbox::MboxSplitter::new(&path)
                .split(&mut |_offset, _bytes| count += 1)
                .unwrap();
            count
        })
    });
}

criterion_group!(
    benches,
    bench_assemble_mixed,
    bench_extract_tree,
    bench_split_inbox
);
criterion_main!(benches);
