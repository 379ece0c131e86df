//! The normalized record produced for each retrieved message.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::address::EmailAddress;
use super::content::ExtractedContent;

/// Envelope metadata plus extracted content for one retrieved message.
///
/// Envelope fields that could not be read are `None` (or empty lists);
/// they never cause the message to be rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedMessage {
    /// 1-based position of the message in its folder at retrieval time.
    pub number: usize,

    /// The `Message-ID` header value, brackets included.
    pub message_id: Option<String>,

    /// First `From:` mailbox.
    pub from: Option<EmailAddress>,

    /// `Sender:` mailbox, when distinct from `From:`.
    pub sender: Option<EmailAddress>,

    pub to: Vec<EmailAddress>,
    pub cc: Vec<EmailAddress>,
    pub bcc: Vec<EmailAddress>,

    /// Decoded subject line.
    pub subject: Option<String>,

    /// Sent date from the `Date:` header, in UTC.
    pub date: Option<DateTime<Utc>>,

    /// Raw size of the message in bytes.
    pub size: Option<u64>,

    /// Top-level `Content-Type` of the message.
    pub content_type: Option<String>,

    /// Body text, body HTML and attachment blobs.
    pub content: ExtractedContent,

    /// Where each attachment was written, in attachment order.
    /// Empty until the receiver persists the attachments.
    pub stored_attachments: Vec<PathBuf>,

    /// Set from the processing callback's verdict.
    pub processing_ok: bool,
}

impl NormalizedMessage {
    pub fn body_text(&self) -> Option<&str> {
        self.content.body_text.as_deref()
    }

    pub fn body_html(&self) -> Option<&str> {
        self.content.body_html.as_deref()
    }

    pub fn has_attachments(&self) -> bool {
        self.content.has_attachments()
    }

    /// Sender for display: `From`, then `Sender`, then an empty string.
    pub fn from_display(&self) -> String {
        self.from
            .as_ref()
            .or(self.sender.as_ref())
            .map(EmailAddress::display)
            .unwrap_or_default()
    }
}
