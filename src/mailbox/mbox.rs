//! Local mailbox store: one directory per user, one mbox file per folder.
//!
//! ```text
//! <root>/<user>/INBOX.mbox
//! <root>/<user>/Archive          (plain name also accepted)
//! ```

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};
use crate::parser::mbox::{MboxSplitter, DEFAULT_MAX_MESSAGE_SIZE};

use super::{CloseSummary, MailAccount, MailStore, MailboxSession, OpenMode, RawMessage};

/// Mailbox store backed by mbox files under a root directory.
#[derive(Debug, Clone)]
pub struct MboxStore {
    root: PathBuf,
    max_message_size: usize,
}

impl MboxStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }
}

impl MailStore for MboxStore {
    type Session = MboxSession;

    fn connect(&self, account: &MailAccount) -> Result<MboxSession> {
        let user = account.user();
        if user.is_empty() || user.contains(['/', '\\']) || user == "." || user == ".." {
            return Err(IngestError::Connection(format!("invalid user name '{user}'")));
        }

        let user_dir = self.root.join(user);
        if !user_dir.is_dir() {
            return Err(IngestError::Connection(format!(
                "no mailbox for user '{user}' under {}",
                self.root.display()
            )));
        }
        debug!(user, dir = %user_dir.display(), "Connected to local mailbox (passwords are not checked)");

        Ok(MboxSession {
            user_dir,
            max_message_size: self.max_message_size,
            open: None,
        })
    }
}

/// Session on one user's mbox directory.
#[derive(Debug)]
pub struct MboxSession {
    user_dir: PathBuf,
    max_message_size: usize,
    open: Option<OpenFolder>,
}

#[derive(Debug)]
struct OpenFolder {
    name: String,
    path: PathBuf,
    mode: OpenMode,
    /// Byte offset of each message; message `n` spans `offsets[n-1]..offsets[n]`.
    offsets: Vec<u64>,
    file_len: u64,
    deleted: BTreeSet<usize>,
}

impl MboxSession {
    /// Folder file: `<folder>.mbox` if present, else `<folder>`.
    fn folder_path(&self, folder: &str) -> Result<PathBuf> {
        if folder.is_empty() || folder.contains(['/', '\\']) || folder.starts_with('.') {
            return Err(IngestError::FolderNotFound {
                folder: folder.to_string(),
            });
        }
        [format!("{folder}.mbox"), folder.to_string()]
            .into_iter()
            .map(|name| self.user_dir.join(name))
            .find(|p| p.is_file())
            .ok_or_else(|| IngestError::FolderNotFound {
                folder: folder.to_string(),
            })
    }
}

impl MailboxSession for MboxSession {
    fn list_messages(&mut self, folder: &str, mode: OpenMode) -> Result<Vec<RawMessage>> {
        if let Some(previous) = self.open.take() {
            if !previous.deleted.is_empty() {
                warn!(
                    folder = %previous.name,
                    marked = previous.deleted.len(),
                    "Discarding deletion marks of previously open folder"
                );
            }
        }

        let path = self.folder_path(folder)?;
        let file_len = std::fs::metadata(&path)
            .map_err(|e| IngestError::io(&path, e))?
            .len();

        let mut offsets = Vec::new();
        let mut messages = Vec::new();
        MboxSplitter::new(&path)
            .with_max_message_size(self.max_message_size)
            .split(&mut |offset, bytes| {
                offsets.push(offset);
                messages.push(RawMessage::new(messages.len() + 1, bytes.to_vec()));
            })?;

        info!(folder, count = messages.len(), ?mode, "Opened folder");
        self.open = Some(OpenFolder {
            name: folder.to_string(),
            path,
            mode,
            offsets,
            file_len,
            deleted: BTreeSet::new(),
        });
        Ok(messages)
    }

    fn mark_deleted(&mut self, message: &RawMessage) -> Result<()> {
        let open = self.open.as_mut().ok_or(IngestError::FolderNotOpen)?;
        if open.mode != OpenMode::ReadWrite {
            return Err(IngestError::ReadOnlyFolder);
        }
        if message.number() == 0 || message.number() > open.offsets.len() {
            warn!(number = message.number(), folder = %open.name, "Ignoring deletion mark for unknown message");
            return Ok(());
        }
        debug!(number = message.number(), folder = %open.name, "Marked message deleted");
        open.deleted.insert(message.number());
        Ok(())
    }

    fn close(mut self, expunge: bool) -> Result<CloseSummary> {
        let Some(open) = self.open.take() else {
            return Ok(CloseSummary::default());
        };
        if !expunge || open.mode != OpenMode::ReadWrite || open.deleted.is_empty() {
            return Ok(CloseSummary::default());
        }
        let expunged = expunge_folder(&open)?;
        info!(folder = %open.name, expunged, "Expunged deleted messages");
        Ok(CloseSummary { expunged })
    }
}

/// Write every message not marked deleted to `tmp_path`.
fn write_kept(open: &OpenFolder, data: &[u8], tmp_path: &Path) -> Result<()> {
    let mut out = std::fs::File::create(tmp_path).map_err(|e| IngestError::io(tmp_path, e))?;
    for (idx, &start) in open.offsets.iter().enumerate() {
        if open.deleted.contains(&(idx + 1)) {
            continue;
        }
        let end = open
            .offsets
            .get(idx + 1)
            .copied()
            .unwrap_or(open.file_len);
        out.write_all(&data[start as usize..end as usize])
            .map_err(|e| IngestError::io(tmp_path, e))?;
    }
    out.sync_all().map_err(|e| IngestError::io(tmp_path, e))
}

/// Run `write` on `tmp_path`, then rename it over `target`. On failure the
/// temporary file is removed and `target` is left as it was.
fn replace_via_temp(
    tmp_path: &Path,
    target: &Path,
    write: impl FnOnce(&Path) -> Result<()>,
) -> Result<()> {
    let result = write(tmp_path)
        .and_then(|()| std::fs::rename(tmp_path, target).map_err(|e| IngestError::io(target, e)));
    if result.is_err() {
        match std::fs::remove_file(tmp_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %tmp_path.display(), error = %e, "Could not remove temporary folder file");
            }
        }
    }
    result
}

/// Rewrite the folder without its deleted messages.
///
/// The new content goes to a sibling temporary file that then replaces the
/// original, so a failure leaves the folder untouched.
fn expunge_folder(open: &OpenFolder) -> Result<usize> {
    let data = std::fs::read(&open.path).map_err(|e| IngestError::io(&open.path, e))?;
    if data.len() as u64 != open.file_len {
        return Err(IngestError::FolderModified {
            folder: open.name.clone(),
        });
    }

    let mut tmp_name = open.path.as_os_str().to_owned();
    tmp_name.push(".expunge");
    let tmp_path = PathBuf::from(tmp_name);

    replace_via_temp(&tmp_path, &open.path, |tmp| write_kept(open, &data, tmp))?;
    Ok(open.deleted.len())
}
