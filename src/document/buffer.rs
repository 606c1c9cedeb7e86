use anyhow::{bail, Result};
use std::fmt;
use std::str::FromStr;

/// Zero-based `(line, column)` position; columns count chars, not bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, column) = s
            .split_once(':')
            .ok_or_else(|| format!("expected LINE:COLUMN, got '{s}'"))?;
        let line = line
            .trim()
            .parse()
            .map_err(|_| format!("invalid line number '{line}'"))?;
        let column = column
            .trim()
            .parse()
            .map_err(|_| format!("invalid column number '{column}'"))?;
        Ok(Self { line, column })
    }
}

/// Something text can be inserted into at a position: an open note, or stdout.
pub trait TextSink {
    /// Where the user's cursor currently is.
    fn cursor(&self) -> Position;

    fn insert_at(&mut self, text: &str, at: Position);
}

/// In-memory note content with a cursor.
///
/// A position resolves to `start of line + column chars`. The column may run
/// past the end of its line, in which case counting continues into the lines
/// that follow (newlines count as one char). An anchor that only ever grows
/// its column by the char length of what was inserted therefore always lands
/// directly after the previous insert, even if that text spanned lines.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    text: String,
    cursor: Position,
    dirty: bool,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let mut buffer = Self {
            text: text.into(),
            cursor: Position::default(),
            dirty: false,
        };
        buffer.cursor = buffer.end_position();
        buffer
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether anything was inserted since the buffer was created.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn line_count(&self) -> usize {
        self.text.matches('\n').count() + 1
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.text.split('\n').nth(index)
    }

    pub fn end_position(&self) -> Position {
        let line = self.line_count() - 1;
        let column = self.line(line).map_or(0, |l| l.chars().count());
        Position { line, column }
    }

    /// Moves the cursor; the position must lie on an existing line.
    pub fn set_cursor(&mut self, at: Position) -> Result<()> {
        let Some(line) = self.line(at.line) else {
            bail!(
                "Line {} is out of range (note has {} lines)",
                at.line,
                self.line_count()
            );
        };
        let width = line.chars().count();
        if at.column > width {
            bail!(
                "Column {} is out of range (line {} has {} characters)",
                at.column,
                at.line,
                width
            );
        }
        self.cursor = at;
        Ok(())
    }

    fn byte_offset(&self, at: Position) -> usize {
        let line_start = if at.line == 0 {
            0
        } else {
            match self.text.match_indices('\n').nth(at.line - 1) {
                Some((index, _)) => index + 1,
                None => return self.text.len(),
            }
        };

        self.text[line_start..]
            .char_indices()
            .nth(at.column)
            .map_or(self.text.len(), |(index, _)| line_start + index)
    }
}

impl TextSink for TextBuffer {
    fn cursor(&self) -> Position {
        self.cursor
    }

    fn insert_at(&mut self, text: &str, at: Position) {
        let offset = self.byte_offset(at);
        self.text.insert_str(offset, text);
        self.dirty |= !text.is_empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_parse() {
        assert_eq!("3:7".parse::<Position>(), Ok(Position::new(3, 7)));
        assert_eq!(" 0 : 0 ".parse::<Position>(), Ok(Position::new(0, 0)));
        assert!("3".parse::<Position>().is_err());
        assert!("a:1".parse::<Position>().is_err());
        assert!("1:-2".parse::<Position>().is_err());
    }

    #[test]
    fn test_new_buffer_cursor_at_end() {
        let buffer = TextBuffer::new("first\nsecond line");
        assert_eq!(buffer.cursor(), Position::new(1, 11));
        assert_eq!(TextBuffer::new("").cursor(), Position::new(0, 0));
        assert_eq!(TextBuffer::new("abc\n").cursor(), Position::new(1, 0));
    }

    #[test]
    fn test_insert_mid_line() {
        let mut buffer = TextBuffer::new("Hello world");
        assert!(!buffer.is_dirty());
        buffer.insert_at("big ", Position::new(0, 6));
        assert_eq!(buffer.text(), "Hello big world");
        assert!(buffer.is_dirty());
    }

    #[test]
    fn test_insert_on_later_line_counts_chars() {
        let mut buffer = TextBuffer::new("héllo\nwörld");
        buffer.insert_at("!", Position::new(1, 2));
        assert_eq!(buffer.text(), "héllo\nwö!rld");
    }

    #[test]
    fn test_column_past_line_end_continues_into_next_line() {
        let mut buffer = TextBuffer::new("ab\ncd");
        // Column 3 on line 0 is just after the newline.
        buffer.insert_at("X", Position::new(0, 3));
        assert_eq!(buffer.text(), "ab\nXcd");
    }

    #[test]
    fn test_out_of_range_inserts_append() {
        let mut buffer = TextBuffer::new("ab");
        buffer.insert_at("!", Position::new(5, 0));
        buffer.insert_at("?", Position::new(0, 99));
        assert_eq!(buffer.text(), "ab!?");
    }

    #[test]
    fn test_advancing_anchor_keeps_multiline_fragments_contiguous() {
        let mut buffer = TextBuffer::new("start|end");
        let mut anchor = Position::new(0, 6);
        for fragment in ["one\n", "two\n", "three"] {
            buffer.insert_at(fragment, anchor);
            anchor.column += fragment.chars().count();
        }
        assert_eq!(buffer.text(), "start|one\ntwo\nthreeend");
        assert_eq!(anchor.line, 0);
    }

    #[test]
    fn test_set_cursor_validates() {
        let mut buffer = TextBuffer::new("abc\nde");
        assert!(buffer.set_cursor(Position::new(1, 2)).is_ok());
        assert_eq!(buffer.cursor(), Position::new(1, 2));
        assert!(buffer.set_cursor(Position::new(1, 3)).is_err());
        assert!(buffer.set_cursor(Position::new(2, 0)).is_err());
        assert_eq!(buffer.cursor(), Position::new(1, 2));
    }
}
