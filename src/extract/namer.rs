//! Attachment namer: derives the relative storage path of an attachment.

use crate::error::ExtractError;

/// Characters that are illegal or ambiguous in a folder name built from a
/// bracketed Message-ID.
const UNSAFE_FOLDER_CHARS: [char; 3] = ['<', '>', '\\'];

/// Folder name for a message: the Message-ID with `<`, `>` and `\` replaced by `-`.
pub fn message_folder(message_id: &str) -> String {
    message_id
        .chars()
        .map(|c| if UNSAFE_FOLDER_CHARS.contains(&c) { '-' } else { c })
        .collect()
}

/// Relative path `<message folder>/<filename>` for an attachment.
///
/// Pure: nothing is created on disk.
pub fn attachment_path(
    message_id: Option<&str>,
    filename: Option<&str>,
    content_type: &str,
) -> Result<String, ExtractError> {
    let filename = filename
        .filter(|f| !f.trim().is_empty())
        .ok_or_else(|| ExtractError::MissingFilename {
            content_type: content_type.to_string(),
        })?;
    let message_id = message_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(ExtractError::MissingMessageId)?;
    Ok(format!("{}/{}", message_folder(message_id), filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_brackets_replaced() {
        assert_eq!(
            attachment_path(Some("<abc@def>"), Some("report.pdf"), "application/pdf").unwrap(),
            "-abc@def-/report.pdf"
        );
    }

    #[test]
    fn test_backslash_replaced() {
        assert_eq!(message_folder("<a\\b@c>"), "-a-b@c-");
    }

    #[test]
    fn test_bare_id_untouched() {
        assert_eq!(message_folder("abc@def"), "abc@def");
    }

    #[test]
    fn test_missing_filename() {
        assert_eq!(
            attachment_path(Some("<abc@def>"), None, "image/png"),
            Err(ExtractError::MissingFilename {
                content_type: "image/png".into()
            })
        );
        assert!(matches!(
            attachment_path(Some("<abc@def>"), Some("  "), "image/png"),
            Err(ExtractError::MissingFilename { .. })
        ));
    }

    #[test]
    fn test_missing_message_id() {
        assert_eq!(
            attachment_path(None, Some("a.txt"), "text/plain"),
            Err(ExtractError::MissingMessageId)
        );
    }
}
