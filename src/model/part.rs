//! Read-only view of one node in a raw MIME tree.
//!
//! Trees are built by the transport adapter ([`crate::parser::mime`]) or by
//! hand in tests. The extractor never mutates them.

use std::borrow::Cow;

use crate::error::ExtractError;
use crate::extract::classify::Shape;

/// Content of a MIME part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    /// Decoded text content of a leaf.
    Text(String),
    /// Decoded binary content of a leaf (images, documents, nested messages).
    Binary(Vec<u8>),
    /// Ordered sub-parts of a multipart container.
    Parts(Vec<MimePart>),
}

/// One node of a message's MIME structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimePart {
    content_type: String,
    filename: Option<String>,
    body: PartBody,
}

impl MimePart {
    pub fn new(content_type: impl Into<String>, filename: Option<String>, body: PartBody) -> Self {
        Self {
            content_type: content_type.into(),
            filename,
            body,
        }
    }

    /// Text leaf without a filename.
    pub fn text(content_type: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(content_type, None, PartBody::Text(text.into()))
    }

    /// Binary leaf with an optional filename.
    pub fn binary(
        content_type: impl Into<String>,
        filename: Option<&str>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self::new(
            content_type,
            filename.map(String::from),
            PartBody::Binary(bytes.into()),
        )
    }

    /// Multipart container.
    pub fn multipart(content_type: impl Into<String>, parts: Vec<MimePart>) -> Self {
        Self::new(content_type, None, PartBody::Parts(parts))
    }

    /// Attach a filename, as declared by Content-Disposition or the `name` parameter.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Full content-type value, possibly with parameters.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self.body, PartBody::Parts(_))
    }

    /// Sub-parts of a multipart container.
    pub fn sub_parts(&self) -> Result<&[MimePart], ExtractError> {
        match &self.body {
            PartBody::Parts(parts) => Ok(parts),
            _ => Err(ExtractError::NotMultipart(self.content_type.clone())),
        }
    }

    /// Text of a leaf. Binary leaves are decoded lossily as UTF-8.
    pub fn text_content(&self) -> Result<Cow<'_, str>, ExtractError> {
        match &self.body {
            PartBody::Text(text) => Ok(Cow::Borrowed(text.as_str())),
            PartBody::Binary(bytes) => Ok(String::from_utf8_lossy(bytes)),
            PartBody::Parts(_) => Err(ExtractError::UnexpectedContentType {
                container: Shape::PlainText,
                found: self.content_type.clone(),
            }),
        }
    }

    /// Bytes to persist when this part is saved as an attachment.
    ///
    /// Multipart containers have no leaf content of their own and yield an
    /// empty slice.
    pub fn raw_bytes(&self) -> &[u8] {
        match &self.body {
            PartBody::Text(text) => text.as_bytes(),
            PartBody::Binary(bytes) => bytes,
            PartBody::Parts(_) => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sub_parts_of_leaf_is_error() {
        let part = MimePart::text("multipart/mixed", "oops");
        assert_eq!(
            part.sub_parts(),
            Err(ExtractError::NotMultipart("multipart/mixed".into()))
        );
    }

    #[test]
    fn test_text_content_from_binary_is_lossy() {
        let part = MimePart::binary("text/plain", None, b"caf\xe9".to_vec());
        assert_eq!(part.text_content().unwrap(), "caf\u{fffd}");
    }

    #[test]
    fn test_raw_bytes() {
        let part = MimePart::text("text/plain", "hello");
        assert_eq!(part.raw_bytes(), b"hello");
        let container = MimePart::multipart("multipart/mixed", vec![part]);
        assert!(container.raw_bytes().is_empty());
        assert!(container.is_multipart());
    }
}
