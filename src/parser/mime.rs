//! Transport adapter: raw RFC 5322 bytes → owned [`MimePart`] tree.
//!
//! `mail-parser` does the transfer-encoding and charset decoding; this module
//! only reshapes its flat part list into the tree the extractor walks.

use mail_parser::{Message, MessageParser, MessagePart, MimeHeaders, PartType};
use tracing::warn;

use crate::error::ExtractError;
use crate::model::part::{MimePart, PartBody};

/// Maximum multipart nesting converted into the tree (guards the recursion
/// against adversarial input; the extraction grammar itself needs three).
const MAX_DEPTH: usize = 10;

/// Parse a raw message, skipping a leading mbox `From ` line and UTF-8 BOM.
pub fn parse_message(raw_message: &[u8]) -> Result<Message<'_>, ExtractError> {
    let message_bytes = skip_from_line(raw_message);
    MessageParser::default()
        .parse(message_bytes)
        .ok_or(ExtractError::UnparseableMessage)
}

/// Build the MIME tree rooted at the message's top-level part.
pub fn mime_tree(message: &Message<'_>) -> MimePart {
    build_part(message, 0, 0)
}

/// Top-level `Content-Type` as declared in the headers (`None` when absent).
pub fn declared_content_type(message: &Message<'_>) -> Option<String> {
    message
        .parts
        .first()
        .and_then(|root| root.content_type())
        .map(format_content_type)
}

fn build_part(message: &Message<'_>, id: usize, depth: usize) -> MimePart {
    let Some(part) = message.parts.get(id) else {
        warn!(part_id = id, "Dangling MIME part reference");
        return MimePart::new("application/octet-stream", None, PartBody::Binary(Vec::new()));
    };

    let content_type = part
        .content_type()
        .map(format_content_type)
        .unwrap_or_else(|| default_content_type(part).to_string());
    let filename = part.attachment_name().map(String::from);

    let body = match &part.body {
        PartType::Text(text) | PartType::Html(text) => PartBody::Text(text.to_string()),
        PartType::Binary(_) | PartType::InlineBinary(_) | PartType::Message(_) => {
            PartBody::Binary(part.contents().to_vec())
        }
        PartType::Multipart(children) => {
            if depth >= MAX_DEPTH {
                warn!(depth, "MIME nesting too deep, dropping sub-parts");
                PartBody::Parts(Vec::new())
            } else {
                PartBody::Parts(
                    children
                        .iter()
                        .map(|&child| build_part(message, child, depth + 1))
                        .collect(),
                )
            }
        }
    };

    MimePart::new(content_type, filename, body)
}

/// `type/subtype`, plus the `charset` parameter when one is declared.
fn format_content_type(ct: &mail_parser::ContentType<'_>) -> String {
    let mut value = match ct.subtype() {
        Some(sub) => format!("{}/{}", ct.ctype(), sub),
        None => ct.ctype().to_string(),
    };
    if let Some(charset) = ct.attribute("charset") {
        value.push_str("; charset=");
        value.push_str(charset);
    }
    value
}

/// RFC 2045 defaults for parts without a `Content-Type` header.
fn default_content_type(part: &MessagePart<'_>) -> &'static str {
    match part.body {
        PartType::Text(_) => "text/plain",
        PartType::Html(_) => "text/html",
        PartType::Multipart(_) => "multipart/mixed",
        PartType::Message(_) => "message/rfc822",
        PartType::Binary(_) | PartType::InlineBinary(_) => "application/octet-stream",
    }
}

/// Skip the `From ` separator line at the start of MBOX messages.
fn skip_from_line(data: &[u8]) -> &[u8] {
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);

    if data.starts_with(b"From ") {
        if let Some(pos) = data.iter().position(|&b| b == b'\n') {
            return &data[pos + 1..];
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALTERNATIVE: &[u8] = b"From: a@example.com\r\n\
Message-ID: <alt@example.com>\r\n\
Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Plain body\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
\r\n\
<p>HTML body</p>\r\n\
--b1--\r\n";

    #[test]
    fn test_skip_from_line() {
        let data = b"From user@example.com Thu Jan 01 00:00:00 2024\nSubject: Test\n\nBody\n";
        assert!(skip_from_line(data).starts_with(b"Subject:"));
    }

    #[test]
    fn test_skip_from_line_no_from() {
        let data = b"Subject: Test\n\nBody\n";
        assert_eq!(skip_from_line(data), data);
    }

    #[test]
    fn test_skip_bom() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice(b"Subject: Test\n\nBody\n");
        assert!(skip_from_line(&data).starts_with(b"Subject:"));
    }

    #[test]
    fn test_tree_of_alternative() {
        let message = parse_message(ALTERNATIVE).unwrap();
        let root = mime_tree(&message);
        assert!(root.content_type().starts_with("multipart/alternative"));
        let parts = root.sub_parts().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].content_type(), "text/plain; charset=utf-8");
        assert!(parts[0].text_content().unwrap().contains("Plain body"));
        assert!(parts[1].content_type().starts_with("text/html"));
        assert!(parts[1].text_content().unwrap().contains("<p>HTML body</p>"));
    }

    #[test]
    fn test_plain_message_without_content_type() {
        let message = parse_message(b"Subject: hi\r\n\r\nJust text\r\n").unwrap();
        let root = mime_tree(&message);
        assert_eq!(root.content_type(), "text/plain");
        assert!(root.text_content().unwrap().contains("Just text"));
        assert_eq!(declared_content_type(&message), None);
    }

    #[test]
    fn test_declared_content_type() {
        let message = parse_message(ALTERNATIVE).unwrap();
        assert_eq!(
            declared_content_type(&message).as_deref(),
            Some("multipart/alternative")
        );
    }
}
