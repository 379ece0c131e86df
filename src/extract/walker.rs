//! MIME content extractor.
//!
//! Recursive-descent walk over the four message shapes produced by common
//! mail clients:
//!
//! ```text
//! root        := plain-text | alternative | related | mixed
//! alternative := { plain-text, html-text }            exactly two, any order
//! related     := alternative + inline-resource*       resources are skipped
//! mixed       := ( related | alternative | plain-text | attachment )*
//! ```
//!
//! Inside `mixed` the first `plain-text` part is the body and any later one
//! is saved as an attachment. Every other shape in `mixed` becomes an
//! attachment, except a nested `multipart/mixed` which is rejected.
//!
//! Each rule returns its own [`ExtractedContent`] fragment; `mixed` folds the
//! fragments of its children with [`ExtractedContent::merge`]. Anything that
//! does not fit the grammar fails the whole message.

use tracing::{debug, trace};

use crate::error::ExtractError;
use crate::model::content::{Attachment, ExtractedContent};
use crate::model::part::MimePart;

use super::classify::{classify, media_type, Shape};
use super::namer;

/// Extract body text, body HTML and attachments from a message's root part.
///
/// `message_id` names the folder of any attachment; it is only required
/// when the message actually has attachments.
pub fn extract_content(
    root: &MimePart,
    message_id: Option<&str>,
) -> Result<ExtractedContent, ExtractError> {
    Walk { message_id }.root(root)
}

/// Per-message walk state. Holds nothing that changes during the walk.
struct Walk<'a> {
    message_id: Option<&'a str>,
}

impl Walk<'_> {
    fn root(&self, part: &MimePart) -> Result<ExtractedContent, ExtractError> {
        let shape = classify(part.content_type())?;
        debug!(content_type = part.content_type(), %shape, "Extracting message root");

        match shape {
            Shape::PlainText => Ok(ExtractedContent::with_text(part.text_content()?)),
            Shape::MultipartAlternative => self.alternative(part),
            Shape::MultipartRelated => self.related(part),
            Shape::MultipartMixed => self.mixed(part),
            Shape::HtmlText | Shape::InlineResource | Shape::Other => Err(
                ExtractError::UnsupportedRootContentType(part.content_type().to_string()),
            ),
        }
    }

    /// `multipart/alternative`: one `text/plain` and one `text/html` leaf.
    fn alternative(&self, part: &MimePart) -> Result<ExtractedContent, ExtractError> {
        let parts = part.sub_parts()?;
        if parts.len() != 2 {
            return Err(ExtractError::UnexpectedPartCount {
                container: Shape::MultipartAlternative,
                expected: 2,
                found: parts.len(),
            });
        }

        let mut content = ExtractedContent::default();
        for (idx, sub) in parts.iter().enumerate() {
            let shape = classify(sub.content_type())?;
            trace!(idx, content_type = sub.content_type(), %shape, "Alternative part");
            match shape {
                Shape::PlainText if content.body_text.is_none() => {
                    content.body_text = Some(sub.text_content()?.into_owned());
                }
                Shape::HtmlText if content.body_html.is_none() => {
                    content.body_html = Some(sub.text_content()?.into_owned());
                }
                _ => return Err(unexpected(Shape::MultipartAlternative, sub)),
            }
        }
        Ok(content)
    }

    /// `multipart/related`: exactly one alternative plus inline resources.
    fn related(&self, part: &MimePart) -> Result<ExtractedContent, ExtractError> {
        let parts = part.sub_parts()?;
        let mut bodies = Vec::with_capacity(1);

        for (idx, sub) in parts.iter().enumerate() {
            let shape = classify(sub.content_type())?;
            trace!(idx, content_type = sub.content_type(), %shape, "Related part");
            match shape {
                Shape::MultipartAlternative => bodies.push(self.alternative(sub)?),
                // Referenced from the HTML body, not a user-visible attachment.
                Shape::InlineResource => {}
                _ => return Err(unexpected(Shape::MultipartRelated, sub)),
            }
        }

        let found = bodies.len();
        match bodies.pop() {
            Some(body) if found == 1 => Ok(body),
            _ => Err(ExtractError::UnexpectedPartCount {
                container: Shape::MultipartRelated,
                expected: 1,
                found,
            }),
        }
    }

    /// `multipart/mixed`: message body plus attachments, in any order.
    fn mixed(&self, part: &MimePart) -> Result<ExtractedContent, ExtractError> {
        part.sub_parts()?
            .iter()
            .enumerate()
            .try_fold(ExtractedContent::default(), |acc, (idx, sub)| {
                let shape = classify(sub.content_type())?;
                trace!(idx, content_type = sub.content_type(), %shape, "Mixed part");
                let fragment = match shape {
                    Shape::MultipartRelated => self.related(sub)?,
                    Shape::MultipartAlternative => self.alternative(sub)?,
                    Shape::PlainText if !acc.has_body_text() => {
                        ExtractedContent::with_text(sub.text_content()?)
                    }
                    Shape::MultipartMixed => return Err(unexpected(Shape::MultipartMixed, sub)),
                    Shape::PlainText | Shape::HtmlText | Shape::InlineResource | Shape::Other => {
                        ExtractedContent::with_attachment(self.attachment(sub)?)
                    }
                };
                Ok(acc.merge(fragment))
            })
    }

    fn attachment(&self, part: &MimePart) -> Result<Attachment, ExtractError> {
        let content_type = media_type(part.content_type());
        let relative_path = namer::attachment_path(self.message_id, part.filename(), &content_type)?;
        debug!(path = %relative_path, size = part.raw_bytes().len(), "Attachment");
        Ok(Attachment {
            relative_path,
            content_type,
            bytes: part.raw_bytes().to_vec(),
        })
    }
}

fn unexpected(container: Shape, part: &MimePart) -> ExtractError {
    ExtractError::UnexpectedContentType {
        container,
        found: part.content_type().to_string(),
    }
}
