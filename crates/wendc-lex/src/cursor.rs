//! Position-tracked character cursor over source text.

/// Walks a `&str` one character at a time, tracking byte offset, line and
/// column. ASCII sources (the expected case for this language) take a
/// direct-byte-index fast path; anything else falls back to `chars()`.
pub struct Cursor<'a> {
    source: &'a str,
    position: usize,
    line: u32,
    column: u32,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Cursor {
            source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.source.len()
    }

    fn char_at(&self, offset: usize) -> char {
        let bytes = self.source.as_bytes();
        let idx = self.position + offset;
        if idx >= bytes.len() {
            return '\0';
        }
        let b = bytes[idx];
        if b.is_ascii() {
            b as char
        } else {
            self.source[idx..].chars().next().unwrap_or('\0')
        }
    }

    pub fn current_char(&self) -> char {
        self.char_at(0)
    }

    pub fn peek_char(&self, offset: usize) -> char {
        self.char_at(offset)
    }

    /// Advances past the current character, updating line/column.
    pub fn advance(&mut self) -> char {
        let c = self.current_char();
        if c == '\0' {
            return c;
        }
        self.position += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_tracks_column() {
        let mut c = Cursor::new("ab");
        assert_eq!(c.current_char(), 'a');
        c.advance();
        assert_eq!(c.column(), 2);
        assert_eq!(c.current_char(), 'b');
    }

    #[test]
    fn test_advance_tracks_newline() {
        let mut c = Cursor::new("a\nb");
        c.advance();
        c.advance();
        assert_eq!(c.line(), 2);
        assert_eq!(c.column(), 1);
        assert_eq!(c.current_char(), 'b');
    }

    #[test]
    fn test_is_at_end() {
        let mut c = Cursor::new("a");
        assert!(!c.is_at_end());
        c.advance();
        assert!(c.is_at_end());
        assert_eq!(c.current_char(), '\0');
    }

    #[test]
    fn test_peek_does_not_consume() {
        let c = Cursor::new("xy");
        assert_eq!(c.peek_char(1), 'y');
        assert_eq!(c.current_char(), 'x');
    }
}
