//! Streaming mbox splitter.
//!
//! Reads an mbox folder line-by-line through a buffered reader and hands
//! each message to a callback. Tolerant of malformed input.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{IngestError, Result};

/// Size of the internal read buffer.
const READ_BUFFER_SIZE: usize = 128 * 1024;

/// Default maximum message size in bytes (256 MB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 256 * 1024 * 1024;

/// Splits an mbox file into raw messages.
///
/// Tolerates:
///
/// - Mixed `\n` and `\r\n` line endings
/// - `From ` lines not preceded by a blank line (logs a warning)
/// - Truncated messages at EOF
/// - UTF-8 BOM at the start of the file
pub struct MboxSplitter {
    path: PathBuf,
    max_message_size: usize,
}

impl MboxSplitter {
    /// Create a splitter for the given mbox file. The file is opened lazily.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Bodies beyond this many bytes are truncated with a warning.
    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Split the whole file, calling `on_message(offset, raw_bytes)` for each
    /// message. `raw_bytes` starts with the `From ` separator line.
    ///
    /// Returns the number of messages found.
    pub fn split(&self, on_message: &mut dyn FnMut(u64, &[u8])) -> Result<u64> {
        let file = File::open(&self.path).map_err(|e| IngestError::io(&self.path, e))?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);

        let mut count: u64 = 0;
        let mut current_offset: u64 = 0;
        let mut message_buf: Vec<u8> = Vec::with_capacity(64 * 1024);
        let mut message_start: u64 = 0;
        let mut prev_line_was_empty = true;
        let mut first_line = true;
        let mut truncated = false;
        let mut line_buf: Vec<u8> = Vec::with_capacity(4096);

        loop {
            line_buf.clear();
            let line_len = reader
                .read_until(b'\n', &mut line_buf)
                .map_err(|e| IngestError::io(&self.path, e))?;
            if line_len == 0 {
                break;
            }

            if is_mbox_separator(&line_buf) {
                if !first_line && !prev_line_was_empty {
                    warn!(
                        offset = current_offset,
                        "Found 'From ' separator without preceding blank line"
                    );
                }
                if !message_buf.is_empty() {
                    on_message(message_start, &message_buf);
                    count += 1;
                }
                message_start = current_offset;
                message_buf.clear();
                message_buf.extend_from_slice(&line_buf);
                truncated = false;
            } else if message_buf.len() + line_buf.len() <= self.max_message_size {
                message_buf.extend_from_slice(&line_buf);
            } else if !truncated {
                warn!(
                    offset = message_start,
                    max_size = self.max_message_size,
                    "Message exceeds maximum size, truncating body"
                );
                truncated = true;
            }

            prev_line_was_empty = is_blank_line(&line_buf);
            first_line = false;
            current_offset += line_len as u64;
        }

        if !message_buf.is_empty() {
            on_message(message_start, &message_buf);
            count += 1;
        }

        Ok(count)
    }
}

/// Check whether a line is an mbox separator (`From ` at the start).
fn is_mbox_separator(line: &[u8]) -> bool {
    let line = line.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(line);
    line.starts_with(b"From ")
}

/// Check whether a line is blank (empty or only whitespace / CR / LF).
fn is_blank_line(line: &[u8]) -> bool {
    line.iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b' ' || b == b'\t')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_bytes(data: &[u8]) -> Vec<(u64, Vec<u8>)> {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), data).unwrap();
        let mut out = Vec::new();
        MboxSplitter::new(tmp.path())
            .split(&mut |offset, bytes| out.push((offset, bytes.to_vec())))
            .unwrap();
        out
    }

    #[test]
    fn test_is_mbox_separator() {
        assert!(is_mbox_separator(
            b"From user@example.com Thu Jan 01 00:00:00 2024\n"
        ));
        assert!(!is_mbox_separator(b"from user@example.com\n"));
        assert!(!is_mbox_separator(b">From user@example.com\n"));
        assert!(!is_mbox_separator(b"Subject: From here\n"));
    }

    #[test]
    fn test_is_mbox_separator_with_bom() {
        let mut line = vec![0xEF, 0xBB, 0xBF];
        line.extend_from_slice(b"From user@example.com Thu Jan 01 00:00:00 2024\n");
        assert!(is_mbox_separator(&line));
    }

    #[test]
    fn test_is_blank_line() {
        assert!(is_blank_line(b"\n"));
        assert!(is_blank_line(b"\r\n"));
        assert!(is_blank_line(b"  \n"));
        assert!(!is_blank_line(b"hello\n"));
    }

    #[test]
    fn test_split_two_messages() {
        let data = b"From a@x Mon Jan 01 00:00:00 2024\nSubject: one\n\nbody one\n\n\
From b@x Mon Jan 01 00:00:00 2024\nSubject: two\n\nbody two\n";
        let messages = split_bytes(data);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].0, 0);
        assert!(messages[0].1.ends_with(b"body one\n\n"));
        assert!(messages[1].1.starts_with(b"From b@x"));
        assert_eq!(messages[1].0 as usize, messages[0].1.len());
    }

    #[test]
    fn test_escaped_from_is_not_separator() {
        let data = b"From a@x Mon Jan 01 00:00:00 2024\nSubject: one\n\n>From the top\n";
        assert_eq!(split_bytes(data).len(), 1);
    }

    #[test]
    fn test_empty_file() {
        assert!(split_bytes(b"").is_empty());
    }

    #[test]
    fn test_missing_file() {
        let result = MboxSplitter::new("/nonexistent/folder.mbox").split(&mut |_, _| {});
        assert!(matches!(result, Err(IngestError::Io { .. })));
    }
}
