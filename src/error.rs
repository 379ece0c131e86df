//! Centralized error types for mailsift.
//!
//! [`ExtractError`] covers the MIME content grammar; [`IngestError`] covers
//! everything around it (mailbox sessions, attachment storage, and the
//! per-message wrapper for extraction failures).

use std::path::PathBuf;

use thiserror::Error;

use crate::extract::classify::Shape;

/// Why a message's MIME tree could not be decoded into an
/// [`ExtractedContent`](crate::model::content::ExtractedContent).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The content-type string was empty.
    #[error("Cannot classify an empty content type")]
    UnclassifiableType,

    /// A sub-part's shape is not allowed inside its container.
    #[error("Unexpected part '{found}' inside {container}")]
    UnexpectedContentType { container: Shape, found: String },

    /// A container did not hold the number of parts its rule requires.
    #[error("Unexpected number of parts in {container}: {found} ({expected} expected)")]
    UnexpectedPartCount {
        container: Shape,
        expected: usize,
        found: usize,
    },

    /// The message root is not one of the four supported shapes.
    #[error("Unsupported root content type '{0}'")]
    UnsupportedRootContentType(String),

    /// A part that must be saved as an attachment declares no filename.
    #[error("Attachment part '{content_type}' has no filename")]
    MissingFilename { content_type: String },

    /// An attachment must be named but the message has no Message-ID.
    #[error("Message has attachments but no Message-ID to name their folder")]
    MissingMessageId,

    /// A `multipart/*` content type whose content is not a part list.
    #[error("Part '{0}' declares a multipart type but has no sub-parts")]
    NotMultipart(String),

    /// The raw bytes are not an RFC 5322 message.
    #[error("Raw message could not be parsed")]
    UnparseableMessage,
}

/// All errors produced by the mailsift library outside the pure grammar.
#[derive(Error, Debug)]
pub enum IngestError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The mailbox store refused or could not open a session.
    #[error("Cannot connect to mailbox store: {0}")]
    Connection(String),

    /// The requested folder does not exist for this account.
    #[error("Folder '{folder}' not found")]
    FolderNotFound { folder: String },

    /// An operation needs an open folder but none is open.
    #[error("No folder is open")]
    FolderNotOpen,

    /// The folder file changed between listing and expunging.
    #[error("Folder '{folder}' has changed since it was opened")]
    FolderModified { folder: String },

    /// A deletion mark was requested on a folder opened read-only.
    #[error("Folder is open read-only; cannot mark messages deleted")]
    ReadOnlyFolder,

    /// An attachment path escapes the storage root.
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Content extraction failed for one message; the message is rejected whole.
    #[error("Cannot extract message #{number} ({}): {source}", .message_id.as_deref().unwrap_or("no Message-ID"))]
    MessageExtractionFailed {
        number: usize,
        message_id: Option<String>,
        source: ExtractError,
    },
}

/// Convenience alias for `Result<T, IngestError>`.
pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
