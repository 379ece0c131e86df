//! Filesystem attachment store rooted at a base directory.

use std::path::{Component, Path, PathBuf};

use crate::error::{IngestError, Result};

use super::AttachmentStore;

/// Writes attachments under `base`, one folder per message.
///
/// Existing files at the same path are overwritten, so re-running a batch
/// over the same messages is idempotent.
#[derive(Debug, Clone)]
pub struct FsAttachmentStore {
    base: PathBuf,
}

impl FsAttachmentStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Join `relative` onto the base, refusing anything that could escape it.
    fn resolve(&self, relative: &Path) -> Result<PathBuf> {
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe || relative.as_os_str().is_empty() {
            return Err(IngestError::InvalidPath(relative.display().to_string()));
        }
        Ok(self.base.join(relative))
    }
}

impl AttachmentStore for FsAttachmentStore {
    fn check(&self, relative: &Path) -> Result<()> {
        self.resolve(relative).map(|_| ())
    }

    fn ensure_folder(&self, relative: &Path) -> Result<()> {
        let folder = self.resolve(relative)?;
        std::fs::create_dir_all(&folder).map_err(|e| IngestError::io(&folder, e))
    }

    fn write_file(&self, relative: &Path, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.resolve(relative)?;
        std::fs::write(&path, bytes).map_err(|e| IngestError::io(&path, e))?;
        Ok(path)
    }

    fn remove_file(&self, stored: &Path) -> Result<()> {
        if !stored.starts_with(&self.base) {
            return Err(IngestError::InvalidPath(stored.display().to_string()));
        }
        std::fs::remove_file(stored).map_err(|e| IngestError::io(stored, e))
    }
}
