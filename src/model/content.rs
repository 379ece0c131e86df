//! Normalized body and attachment content extracted from a MIME tree.

use serde::{Deserialize, Serialize};

/// An attachment blob together with the relative path it should be stored at.
///
/// The path is `<sanitized message id>/<filename>`; nothing is written to
/// disk until the caller hands the blob to an
/// [`AttachmentStore`](crate::store::AttachmentStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub relative_path: String,
    /// MIME content type of the source part.
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Size of the decoded content in bytes.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Final path component (the part's filename).
    pub fn filename(&self) -> &str {
        self.relative_path
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.relative_path)
    }
}

/// Body text, body HTML and attachments of one message.
///
/// Each body is set at most once; the first value wins when fragments are
/// merged. Attachments keep encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub body_text: Option<String>,
    pub body_html: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl ExtractedContent {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            body_text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_attachment(attachment: Attachment) -> Self {
        Self {
            attachments: vec![attachment],
            ..Self::default()
        }
    }

    /// Combine a later fragment into this one.
    ///
    /// Bodies already present are kept; attachments from `later` are appended.
    pub fn merge(mut self, later: ExtractedContent) -> Self {
        if self.body_text.is_none() {
            self.body_text = later.body_text;
        }
        if self.body_html.is_none() {
            self.body_html = later.body_html;
        }
        self.attachments.extend(later.attachments);
        self
    }

    pub fn has_body_text(&self) -> bool {
        self.body_text.is_some()
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
