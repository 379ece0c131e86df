//! Attachment storage: the only I/O-bearing step after extraction.
//!
//! Extraction yields in-memory blobs with relative paths; an
//! [`AttachmentStore`] decides where those paths land.

pub mod fs;

pub use fs::FsAttachmentStore;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::model::content::ExtractedContent;

/// Destination for extracted attachment files.
pub trait AttachmentStore {
    /// Validate `relative` without touching storage.
    fn check(&self, relative: &Path) -> Result<()>;

    /// Create the folder at `relative` if it does not exist yet.
    fn ensure_folder(&self, relative: &Path) -> Result<()>;

    /// Write `bytes` at `relative`, returning the final location.
    fn write_file(&self, relative: &Path, bytes: &[u8]) -> Result<PathBuf>;

    /// Remove a file previously returned by [`write_file`](Self::write_file).
    fn remove_file(&self, stored: &Path) -> Result<()>;
}

/// Store every attachment of one message, sequentially and in order.
///
/// All paths are checked before anything is written. If a write still fails,
/// the files already written for this message are removed, so a failed
/// message leaves nothing behind. Returns where each attachment was written.
pub fn persist_attachments(
    store: &dyn AttachmentStore,
    content: &ExtractedContent,
) -> Result<Vec<PathBuf>> {
    for attachment in &content.attachments {
        store.check(Path::new(&attachment.relative_path))?;
    }

    let mut stored = Vec::with_capacity(content.attachments.len());
    for attachment in &content.attachments {
        match write_one(store, &attachment.relative_path, &attachment.bytes) {
            Ok(path) => stored.push(path),
            Err(e) => {
                roll_back(store, &stored);
                return Err(e);
            }
        }
    }
    Ok(stored)
}

fn write_one(store: &dyn AttachmentStore, relative: &str, bytes: &[u8]) -> Result<PathBuf> {
    let relative = Path::new(relative);
    if let Some(folder) = relative.parent().filter(|p| !p.as_os_str().is_empty()) {
        store.ensure_folder(folder)?;
    }
    let path = store.write_file(relative, bytes)?;
    debug!(path = %path.display(), size = bytes.len(), "Stored attachment");
    Ok(path)
}

fn roll_back(store: &dyn AttachmentStore, stored: &[PathBuf]) {
    for path in stored {
        if let Err(e) = store.remove_file(path) {
            warn!(path = %path.display(), error = %e, "Could not remove partial attachment");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::error::IngestError;
    use crate::model::content::Attachment;

    /// Filesystem store whose `n`-th write fails.
    struct FailingStore {
        inner: FsAttachmentStore,
        fail_at: usize,
        writes: Cell<usize>,
    }

    impl AttachmentStore for FailingStore {
        fn check(&self, relative: &Path) -> Result<()> {
            self.inner.check(relative)
        }

        fn ensure_folder(&self, relative: &Path) -> Result<()> {
            self.inner.ensure_folder(relative)
        }

        fn write_file(&self, relative: &Path, bytes: &[u8]) -> Result<PathBuf> {
            let n = self.writes.get() + 1;
            self.writes.set(n);
            if n == self.fail_at {
                return Err(IngestError::io(
                    relative,
                    std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                ));
            }
            self.inner.write_file(relative, bytes)
        }

        fn remove_file(&self, stored: &Path) -> Result<()> {
            self.inner.remove_file(stored)
        }
    }

    fn attachment(path: &str) -> Attachment {
        Attachment {
            relative_path: path.to_string(),
            content_type: "application/octet-stream".to_string(),
            bytes: b"data".to_vec(),
        }
    }

    #[test]
    fn test_failed_write_removes_earlier_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FailingStore {
            inner: FsAttachmentStore::new(tmp.path()),
            fail_at: 3,
            writes: Cell::new(0),
        };
        let content = ExtractedContent {
            attachments: vec![attachment("m/a.bin"), attachment("m/b.bin"), attachment("m/c.bin")],
            ..ExtractedContent::default()
        };

        assert!(matches!(
            persist_attachments(&store, &content),
            Err(IngestError::Io { .. })
        ));
        assert!(!tmp.path().join("m/a.bin").exists());
        assert!(!tmp.path().join("m/b.bin").exists());
    }
}
