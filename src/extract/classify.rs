//! Content classifier: maps a content-type string to the shape the
//! extractor's grammar dispatches on.

use crate::error::ExtractError;

/// Closed set of part shapes the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    PlainText,
    HtmlText,
    MultipartAlternative,
    MultipartRelated,
    MultipartMixed,
    InlineResource,
    Other,
}

impl Shape {
    /// Tag used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlainText => "plain-text",
            Self::HtmlText => "html-text",
            Self::MultipartAlternative => "multipart-alternative",
            Self::MultipartRelated => "multipart-related",
            Self::MultipartMixed => "multipart-mixed",
            Self::InlineResource => "inline-resource",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a content-type value such as `"multipart/mixed; boundary=xyz"`.
///
/// Matching is case-insensitive and ignores parameters: `text/plain` and
/// `text/html` must match the media type exactly, the multipart kinds and
/// `image/` match by prefix.
pub fn classify(content_type: &str) -> Result<Shape, ExtractError> {
    let media_type = media_type(content_type);
    if media_type.is_empty() {
        return Err(ExtractError::UnclassifiableType);
    }

    let shape = if media_type == "text/plain" {
        Shape::PlainText
    } else if media_type == "text/html" {
        Shape::HtmlText
    } else if media_type.starts_with("multipart/alternative") {
        Shape::MultipartAlternative
    } else if media_type.starts_with("multipart/related") {
        Shape::MultipartRelated
    } else if media_type.starts_with("multipart/mixed") {
        Shape::MultipartMixed
    } else if media_type.starts_with("image/") {
        Shape::InlineResource
    } else {
        Shape::Other
    };
    Ok(shape)
}

/// Lower-cased `type/subtype` with parameters and whitespace removed.
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
