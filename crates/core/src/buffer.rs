//! Line-oriented text buffers that resolution actions mutate.

use crate::errors::BufferError;

/// A document the conflict engine can read and rewrite.
///
/// Line numbers are 1-based; ranges are inclusive.
pub trait TextBuffer {
    fn line_count(&self) -> usize;

    fn line(&self, line: usize) -> Option<&str>;

    fn lines(&self) -> Vec<String>;

    /// Replace lines `start..=end` with `replacement` in one edit.
    fn replace_lines(
        &mut self,
        start: usize,
        end: usize,
        replacement: &[String],
    ) -> Result<(), BufferError>;
}

/// In-memory buffer backed by a `Vec<String>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
    trailing_newline: bool,
    line_ending: &'static str,
}

impl LineBuffer {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            trailing_newline: true,
            line_ending: "\n",
        }
    }

    /// Split `text` into lines, remembering its line ending and whether it
    /// ended with one. The first line terminator decides between LF and CRLF.
    pub fn from_text(text: &str) -> Self {
        let line_ending = match text.find('\n') {
            Some(i) if text[..i].ends_with('\r') => "\r\n",
            _ => "\n",
        };
        Self {
            lines: text.lines().map(str::to_string).collect(),
            trailing_newline: text.ends_with('\n'),
            line_ending,
        }
    }

    /// `"\n"` or `"\r\n"`.
    pub fn line_ending(&self) -> &'static str {
        self.line_ending
    }

    pub fn to_text(&self) -> String {
        let mut text = self.lines.join(self.line_ending);
        if self.trailing_newline && !self.lines.is_empty() {
            text.push_str(self.line_ending);
        }
        text
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TextBuffer for LineBuffer {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, line: usize) -> Option<&str> {
        line.checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
    }

    fn lines(&self) -> Vec<String> {
        self.lines.clone()
    }

    fn replace_lines(
        &mut self,
        start: usize,
        end: usize,
        replacement: &[String],
    ) -> Result<(), BufferError> {
        if start == 0 || start > end || end > self.lines.len() {
            return Err(BufferError::OutOfRange {
                start,
                end,
                line_count: self.lines.len(),
            });
        }
        let tail = self.lines.split_off(end);
        self.lines.truncate(start - 1);
        self.lines.extend(replacement.iter().cloned());
        self.lines.extend(tail);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_round_trip_keeps_trailing_newline() {
        assert_eq!(LineBuffer::from_text("a\nb\n").to_text(), "a\nb\n");
        assert_eq!(LineBuffer::from_text("a\nb").to_text(), "a\nb");
        assert_eq!(LineBuffer::from_text("").to_text(), "");
    }

    #[test]
    fn test_crlf_text_keeps_line_endings() {
        let mut buffer = LineBuffer::from_text("a\r\nb\r\nc\r\n");
        assert_eq!(buffer.line_ending(), "\r\n");
        assert_eq!(buffer.line(2), Some("b"));
        assert_eq!(buffer.to_text(), "a\r\nb\r\nc\r\n");

        buffer.replace_lines(2, 2, &["x".to_string()]).unwrap();
        assert_eq!(buffer.to_text(), "a\r\nx\r\nc\r\n");

        assert_eq!(LineBuffer::from_text("a\r\nb").to_text(), "a\r\nb");
        assert_eq!(LineBuffer::from_text("a\nb\n").line_ending(), "\n");
    }

    #[test]
    fn test_replace_lines() {
        let mut buffer = LineBuffer::from_text("1\n2\n3\n4\n");
        buffer
            .replace_lines(2, 3, &["x".to_string()])
            .unwrap();
        assert_eq!(buffer.to_text(), "1\nx\n4\n");
        assert_eq!(buffer.line(2), Some("x"));
        assert_eq!(buffer.line(0), None);

        buffer.replace_lines(1, 3, &[]).unwrap();
        assert_eq!(buffer.line_count(), 0);
    }

    #[test]
    fn test_replace_out_of_range() {
        let mut buffer = LineBuffer::from_text("1\n2\n");
        assert_eq!(
            buffer.replace_lines(2, 3, &[]),
            Err(BufferError::OutOfRange {
                start: 2,
                end: 3,
                line_count: 2
            })
        );
        assert!(buffer.replace_lines(0, 1, &[]).is_err());
        assert!(buffer.replace_lines(2, 1, &[]).is_err());
    }
}
