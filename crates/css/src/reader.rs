//! Character reader
//!
//! A cursor over normalized source text that tracks line and column and
//! supports a single mark/reset checkpoint for speculative reads.

use crate::error::Position;

#[derive(Debug, Clone, Copy)]
struct Bookmark {
    cursor: usize,
    line: usize,
    column: usize,
}

/// Character cursor with line/column tracking
#[derive(Debug)]
pub struct Reader {
    chars: Vec<char>,
    cursor: usize,
    line: usize,
    column: usize,
    bookmark: Option<Bookmark>,
}

impl Reader {
    /// Create a reader, folding `\r\n` and lone `\r` into `\n`
    pub fn new(input: &str) -> Self {
        let mut chars = Vec::with_capacity(input.len());
        let mut iter = input.chars().peekable();
        while let Some(c) = iter.next() {
            if c == '\r' {
                if iter.peek() == Some(&'\n') {
                    iter.next();
                }
                chars.push('\n');
            } else {
                chars.push(c);
            }
        }

        Self {
            chars,
            cursor: 0,
            line: 1,
            column: 1,
            bookmark: None,
        }
    }

    /// Position of the next character to be read
    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    pub fn eof(&self) -> bool {
        self.cursor >= self.chars.len()
    }

    /// Look at the next character without consuming it
    pub fn peek(&self) -> Option<char> {
        self.peek_at(1)
    }

    /// Look `offset` characters ahead (1 is the next character)
    pub fn peek_at(&self, offset: usize) -> Option<char> {
        if offset == 0 {
            return None;
        }
        self.chars.get(self.cursor + offset - 1).copied()
    }

    /// Consume the next character
    pub fn read(&mut self) -> Option<char> {
        let c = *self.chars.get(self.cursor)?;
        self.cursor += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Save the current cursor so a speculative read can be undone
    pub fn mark(&mut self) {
        self.bookmark = Some(Bookmark {
            cursor: self.cursor,
            line: self.line,
            column: self.column,
        });
    }

    /// Rewind to the last mark
    ///
    /// # Panics
    ///
    /// Panics if `mark` was never called.
    pub fn reset(&mut self) {
        let bookmark = self.bookmark.expect("Reader::reset called without a prior mark");
        self.cursor = bookmark.cursor;
        self.line = bookmark.line;
        self.column = bookmark.column;
    }

    /// Read characters until the text read so far ends with `pattern`.
    /// Returns `None` (with the cursor at end of input) if it never does.
    pub fn read_to(&mut self, pattern: &str) -> Option<String> {
        let mut buffer = String::new();
        while !buffer.ends_with(pattern) {
            buffer.push(self.read()?);
        }
        Some(buffer)
    }

    /// Read characters while `filter` accepts them
    pub fn read_while(&mut self, filter: impl Fn(char) -> bool) -> String {
        let mut buffer = String::new();
        while let Some(c) = self.peek() {
            if !filter(c) {
                break;
            }
            buffer.push(c);
            self.read();
        }
        buffer
    }

    /// Read up to `count` characters
    pub fn read_count(&mut self, count: usize) -> String {
        let mut buffer = String::new();
        for _ in 0..count {
            match self.read() {
                Some(c) => buffer.push(c),
                None => break,
            }
        }
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_tracks_lines() {
        let mut reader = Reader::new("ab\ncd");
        assert_eq!(reader.read(), Some('a'));
        assert_eq!(reader.position(), Position::new(1, 2));
        reader.read();
        reader.read();
        assert_eq!(reader.position(), Position::new(2, 1));
        assert_eq!(reader.read(), Some('c'));
        assert_eq!(reader.position(), Position::new(2, 2));
    }

    #[test]
    fn test_newline_normalization() {
        for input in ["a\r\nb", "a\rb", "a\nb"] {
            let mut reader = Reader::new(input);
            reader.read();
            assert_eq!(reader.read(), Some('\n'));
            assert_eq!(reader.position(), Position::new(2, 1));
            assert_eq!(reader.read(), Some('b'));
            assert!(reader.eof());
        }
    }

    #[test]
    fn test_peek_does_not_consume() {
        let reader = Reader::new("xyz");
        assert_eq!(reader.peek(), Some('x'));
        assert_eq!(reader.peek_at(3), Some('z'));
        assert_eq!(reader.peek_at(4), None);
        assert_eq!(reader.position(), Position::new(1, 1));
    }

    #[test]
    fn test_mark_and_reset() {
        let mut reader = Reader::new("@media\nscreen");
        reader.mark();
        assert_eq!(reader.read_count(7), "@media\n");
        assert_eq!(reader.position(), Position::new(2, 1));
        reader.reset();
        assert_eq!(reader.position(), Position::new(1, 1));
        assert_eq!(reader.peek(), Some('@'));
    }

    #[test]
    #[should_panic(expected = "without a prior mark")]
    fn test_reset_without_mark_panics() {
        let mut reader = Reader::new("abc");
        reader.reset();
    }

    #[test]
    fn test_read_to_and_while() {
        let mut reader = Reader::new("progid:Foo.Bar(x)");
        assert_eq!(reader.read_while(|c| c.is_ascii_alphabetic()), "progid");
        assert_eq!(reader.read_to("(").as_deref(), Some(":Foo.Bar("));
        assert_eq!(reader.read_to("]"), None);
        assert!(reader.eof());
    }
}
