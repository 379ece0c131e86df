//! CLI entry point for `mailsift`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use mailsift::assemble::assemble_bytes;
use mailsift::config::{self, Config};
use mailsift::mailbox::{MailAccount, MboxStore};
use mailsift::model::message::NormalizedMessage;
use mailsift::receiver::{MailReceiver, ReceiveReport};
use mailsift::store::{persist_attachments, FsAttachmentStore};

#[derive(Parser)]
#[command(
    name = "mailsift",
    version,
    about = "Normalize mailbox messages into text, HTML and attachment files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a mailbox folder and extract every message
    Receive {
        /// Mailbox user
        #[arg(short, long, env = "MAILSIFT_USER")]
        user: String,
        /// Mailbox password
        #[arg(short, long, env = "MAILSIFT_PASSWORD", hide_env_values = true, default_value = "")]
        password: String,
        /// Mailbox root directory (`<root>/<user>/<folder>.mbox`)
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,
        /// Folder to read (default from config, else INBOX)
        #[arg(short, long)]
        folder: Option<String>,
        /// Delete messages whose processing succeeded
        #[arg(long)]
        delete: bool,
        /// Directory where attachments are written
        #[arg(short, long, value_name = "DIR")]
        attachments: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Extract a single message file (.eml)
    Extract {
        path: PathBuf,
        /// Write attachments under this directory
        #[arg(short, long, value_name = "DIR")]
        attachments: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config();

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Receive {
            user,
            password,
            root,
            folder,
            delete,
            attachments,
            json,
        } => {
            let account = MailAccount::new(user, password);
            let root = root.unwrap_or_else(|| config::mailbox_root(&config));
            let folder = folder.unwrap_or_else(|| config.mailbox.folder.clone());
            let attachments = attachments.unwrap_or_else(|| config::attachments_dir(&config));
            let delete = delete || config.mailbox.delete_after_processing;
            cmd_receive(
                &config,
                &account,
                &root,
                &folder,
                delete,
                &attachments,
                json,
            )
        }
        Commands::Extract {
            path,
            attachments,
            json,
        } => cmd_extract(&path, attachments.as_deref(), json),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::log_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "mailsift.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mailsift", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Read one folder and print what was extracted.
fn cmd_receive(
    config: &Config,
    account: &MailAccount,
    root: &Path,
    folder: &str,
    delete: bool,
    attachments: &Path,
    json: bool,
) -> anyhow::Result<()> {
    if !root.is_dir() {
        anyhow::bail!("Mailbox root not found: {}", root.display());
    }

    let store = MboxStore::new(root).with_max_message_size(config.limits.max_message_size);
    let receiver = MailReceiver::new(store, FsAttachmentStore::new(attachments));

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Extracting [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let mut log_processed = |message: &NormalizedMessage| {
        info!(
            number = message.number,
            message_id = message.message_id.as_deref().unwrap_or(""),
            attachments = message.stored_attachments.len(),
            "Processed message"
        );
        true
    };

    let start = Instant::now();
    let report = receiver.read_messages(
        account,
        folder,
        delete,
        &mut log_processed,
        &|done, total| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        },
    )?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    if json {
        print_report_json(folder, &report, elapsed)?;
    } else {
        print_report_table(folder, &report, elapsed);
    }
    Ok(())
}

/// Extract one `.eml` file, optionally writing its attachments.
fn cmd_extract(path: &Path, attachments: Option<&Path>, json: bool) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }

    let raw = std::fs::read(path)?;
    let mut message = assemble_bytes(1, &raw)?;
    if let Some(dir) = attachments {
        let store = FsAttachmentStore::new(dir);
        message.stored_attachments = persist_attachments(&store, &message.content)?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&message_json(&message))?);
    } else {
        print_message(&message);
    }
    Ok(())
}

fn message_json(message: &NormalizedMessage) -> serde_json::Value {
    serde_json::json!({
        "number": message.number,
        "message_id": message.message_id,
        "from": message.from,
        "to": message.to,
        "cc": message.cc,
        "subject": message.subject,
        "date": message.date.map(|d| d.to_rfc3339()),
        "size": message.size,
        "content_type": message.content_type,
        "body_text": message.body_text(),
        "body_html": message.body_html(),
        "attachments": message.content.attachments.iter().map(|a| serde_json::json!({
            "path": a.relative_path,
            "content_type": a.content_type,
            "size": a.size(),
        })).collect::<Vec<_>>(),
        "stored_attachments": message.stored_attachments,
        "processing_ok": message.processing_ok,
    })
}

/// Print a single extracted message.
fn print_message(message: &NormalizedMessage) {
    use humansize::{format_size, BINARY};

    println!();
    println!(
        "  {:<14} {}",
        "Message-ID",
        message.message_id.as_deref().unwrap_or("-")
    );
    println!("  {:<14} {}", "From", message.from_display());
    println!(
        "  {:<14} {}",
        "Subject",
        message.subject.as_deref().unwrap_or("")
    );
    if let Some(date) = message.date {
        println!("  {:<14} {}", "Date", date.format("%Y-%m-%d %H:%M"));
    }
    println!(
        "  {:<14} {}",
        "Content-Type",
        message.content_type.as_deref().unwrap_or("-")
    );
    println!(
        "  {:<14} {}",
        "HTML body",
        if message.body_html().is_some() { "yes" } else { "no" }
    );

    if !message.content.attachments.is_empty() {
        println!();
        println!("  {:<50} {:<28} {:>10}", "Attachment", "Type", "Size");
        println!("  {}", "-".repeat(90));
        for attachment in &message.content.attachments {
            let path: String = attachment.relative_path.chars().take(49).collect();
            println!(
                "  {:<50} {:<28} {:>10}",
                path,
                attachment.content_type,
                format_size(attachment.size(), BINARY)
            );
        }
    }

    if let Some(text) = message.body_text() {
        println!();
        println!("{text}");
    }
    println!();
}

/// Print a folder run as a human-readable table.
fn print_report_table(folder: &str, report: &ReceiveReport, elapsed: std::time::Duration) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<20} {}", "Folder", folder);
    println!("  {:<20} {}", "Messages", report.total());
    println!("  {:<20} {}", "Extracted", report.messages.len());
    println!("  {:<20} {}", "Failed", report.failures.len());
    println!("  {:<20} {}", "Deleted", report.close.expunged);
    println!("  {:<20} {:.2?}", "Time", elapsed);

    if !report.messages.is_empty() {
        println!();
        println!(
            "  {:<4} {:<17} {:<25} {:<40} {:>4} {:>8}",
            "#", "Date", "From", "Subject", "Att", "Size"
        );
        println!("  {}", "-".repeat(103));
        for message in &report.messages {
            let date = message
                .date
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            let from: String = message.from_display().chars().take(24).collect();
            let subject: String = message
                .subject
                .as_deref()
                .unwrap_or("")
                .chars()
                .take(39)
                .collect();
            println!(
                "  {:<4} {:<17} {:<25} {:<40} {:>4} {:>8}",
                message.number,
                date,
                from,
                subject,
                message.content.attachments.len(),
                format_size(message.size.unwrap_or(0), BINARY)
            );
        }
    }

    if !report.failures.is_empty() {
        println!();
        println!("  Failures:");
        for failure in &report.failures {
            println!("    {:>6}  {}", failure.number, failure.error);
        }
    }
    println!();
}

/// Print a folder run as JSON.
fn print_report_json(
    folder: &str,
    report: &ReceiveReport,
    elapsed: std::time::Duration,
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "folder": folder,
        "message_count": report.total(),
        "extracted": report.messages.len(),
        "expunged": report.close.expunged,
        "elapsed_ms": elapsed.as_millis(),
        "messages": report.messages.iter().map(message_json).collect::<Vec<_>>(),
        "failures": report.failures.iter().map(|f| serde_json::json!({
            "number": f.number,
            "error": f.error.to_string(),
        })).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
