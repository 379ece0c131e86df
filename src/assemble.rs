//! Message assembler: envelope fields + extracted content → [`NormalizedMessage`].

use chrono::{DateTime, Utc};
use mail_parser::Message;
use tracing::debug;

use crate::error::{ExtractError, IngestError, Result};
use crate::extract::extract_content;
use crate::mailbox::RawMessage;
use crate::model::address::EmailAddress;
use crate::model::message::NormalizedMessage;
use crate::parser::mime;

/// Build the normalized record for a retrieved message.
pub fn assemble(raw: &RawMessage) -> Result<NormalizedMessage> {
    assemble_bytes(raw.number(), raw.bytes())
}

/// Build the normalized record from raw RFC 5322 bytes (an `.eml` file or
/// one mbox entry).
///
/// Missing or unreadable envelope fields become `None`. Any content
/// extraction failure rejects the whole message with
/// [`IngestError::MessageExtractionFailed`].
pub fn assemble_bytes(number: usize, raw: &[u8]) -> Result<NormalizedMessage> {
    let failed = |message_id: Option<String>, source: ExtractError| {
        IngestError::MessageExtractionFailed {
            number,
            message_id,
            source,
        }
    };

    let message = mime::parse_message(raw).map_err(|e| failed(None, e))?;
    // mail-parser strips the angle brackets; keep the header's own form.
    let message_id = message.message_id().map(|id| format!("<{id}>"));

    let root = mime::mime_tree(&message);
    let content = extract_content(&root, message_id.as_deref())
        .map_err(|e| failed(message_id.clone(), e))?;

    debug!(
        number,
        message_id = message_id.as_deref().unwrap_or(""),
        attachments = content.attachments.len(),
        "Assembled message"
    );

    Ok(NormalizedMessage {
        number,
        message_id,
        from: EmailAddress::first_from(message.from()),
        sender: EmailAddress::first_from(message.sender()),
        to: EmailAddress::list_from(message.to()),
        cc: EmailAddress::list_from(message.cc()),
        bcc: EmailAddress::list_from(message.bcc()),
        subject: message.subject().map(String::from),
        date: sent_date(&message),
        size: Some(raw.len() as u64),
        content_type: mime::declared_content_type(&message),
        content,
        stored_attachments: Vec::new(),
        processing_ok: false,
    })
}

/// `Date:` header in UTC, if present and valid.
fn sent_date(message: &Message<'_>) -> Option<DateTime<Utc>> {
    let rfc3339 = message.date()?.to_rfc3339();
    DateTime::parse_from_rfc3339(&rfc3339)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Shape;

    const MIXED: &[u8] = b"From: Alice <alice@example.com>\r\n\
To: Bob <bob@example.com>, carol@example.com\r\n\
Cc: dave@example.com\r\n\
Subject: Quarterly report\r\n\
Date: Thu, 04 Jan 2024 10:00:00 +0100\r\n\
Message-ID: <abc@def>\r\n\
Content-Type: multipart/mixed; boundary=\"mix\"\r\n\
\r\n\
--mix\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
See attached.\r\n\
--mix\r\n\
Content-Type: application/pdf; name=\"report.pdf\"\r\n\
Content-Disposition: attachment; filename=\"report.pdf\"\r\n\
Content-Transfer-Encoding: base64\r\n\
\r\n\
JVBERi0xLjQK\r\n\
--mix--\r\n";

    #[test]
    fn test_assemble_envelope_and_content() {
        let msg = assemble_bytes(1, MIXED).unwrap();
        assert_eq!(msg.number, 1);
        assert_eq!(msg.message_id.as_deref(), Some("<abc@def>"));
        assert_eq!(msg.from.as_ref().unwrap().address, "alice@example.com");
        assert_eq!(msg.to.len(), 2);
        assert_eq!(msg.cc[0].address, "dave@example.com");
        assert!(msg.bcc.is_empty());
        assert!(msg.sender.is_none());
        assert_eq!(msg.subject.as_deref(), Some("Quarterly report"));
        assert_eq!(
            msg.date.unwrap().to_rfc3339(),
            "2024-01-04T09:00:00+00:00"
        );
        assert_eq!(msg.size, Some(MIXED.len() as u64));
        assert_eq!(msg.content_type.as_deref(), Some("multipart/mixed"));

        assert!(msg.body_text().unwrap().contains("See attached."));
        assert_eq!(msg.content.attachments.len(), 1);
        let attachment = &msg.content.attachments[0];
        assert_eq!(attachment.relative_path, "-abc@def-/report.pdf");
        assert_eq!(attachment.bytes, b"%PDF-1.4\n");
        assert!(!msg.processing_ok);
    }

    #[test]
    fn test_missing_headers_are_absent() {
        let msg = assemble_bytes(7, b"Content-Type: text/plain\r\n\r\nhello\r\n").unwrap();
        assert!(msg.from.is_none());
        assert!(msg.subject.is_none());
        assert!(msg.date.is_none());
        assert!(msg.message_id.is_none());
        assert!(msg.to.is_empty());
        assert!(msg.body_text().unwrap().contains("hello"));
    }

    #[test]
    fn test_unsupported_root_rejects_message() {
        let raw = b"Message-ID: <x@y>\r\nContent-Type: application/octet-stream\r\n\r\nAAAA\r\n";
        let err = assemble_bytes(2, raw).unwrap_err();
        match err {
            IngestError::MessageExtractionFailed {
                number,
                message_id,
                source,
            } => {
                assert_eq!(number, 2);
                assert_eq!(message_id.as_deref(), Some("<x@y>"));
                assert_eq!(
                    source,
                    ExtractError::UnsupportedRootContentType("application/octet-stream".into())
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_alternative_rejects_message() {
        let raw = b"Message-ID: <x@y>\r\n\
Content-Type: multipart/alternative; boundary=\"b\"\r\n\
\r\n\
--b\r\n\
Content-Type: text/plain\r\n\
\r\n\
only one\r\n\
--b--\r\n";
        let err = assemble_bytes(1, raw).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MessageExtractionFailed {
                source: ExtractError::UnexpectedPartCount {
                    container: Shape::MultipartAlternative,
                    expected: 2,
                    found: 1,
                },
                ..
            }
        ));
    }
}
