use std::ops::Range;

use crate::position::{Position, Span};

#[derive(Debug, Clone, Copy)]
struct LineStart {
    byte: usize,
    offset: usize,
}

/// Maps byte offsets, character offsets and line/character pairs of one text
/// onto each other.
///
/// Only `\n` ends a line. A `\r` before it is an ordinary character as far
/// as column counting goes.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    lines: Vec<LineStart>,
    total_chars: usize,
}

impl<'a> LineIndex<'a> {
    /// Index `text`.
    pub fn new(text: &'a str) -> Self {
        let mut lines = vec![LineStart { byte: 0, offset: 0 }];
        let mut total_chars = 0;
        for (byte, c) in text.char_indices() {
            total_chars += 1;
            if c == '\n' {
                lines.push(LineStart {
                    byte: byte + 1,
                    offset: total_chars,
                });
            }
        }
        Self {
            text,
            lines,
            total_chars,
        }
    }

    /// The indexed text.
    pub fn text(&self) -> &'a str {
        self.text
    }

    /// Number of lines. An empty text, or a text ending in `\n`, still has a
    /// last (empty) line.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Position of the end of the document.
    pub fn end(&self) -> Position {
        self.position_at_offset(self.total_chars)
    }

    /// Position of a byte offset. Offsets past the end clamp to the end, and
    /// offsets inside a multi-byte character snap back to its first byte.
    pub fn position_at_byte(&self, byte: usize) -> Position {
        let mut byte = byte.min(self.text.len());
        while !self.text.is_char_boundary(byte) {
            byte -= 1;
        }
        let line = self.lines.partition_point(|l| l.byte <= byte) - 1;
        let start = self.lines[line];
        let character = self.text[start.byte..byte].chars().count();
        Position::new(start.offset + character, line as u32, character as u32)
    }

    /// Position of a character offset, clamped to the end of the document.
    pub fn position_at_offset(&self, offset: usize) -> Position {
        let offset = offset.min(self.total_chars);
        let line = self.lines.partition_point(|l| l.offset <= offset) - 1;
        let start = self.lines[line];
        Position::new(offset, line as u32, (offset - start.offset) as u32)
    }

    /// Complete a `(line, character)` pair with its offset. Lines past the
    /// end clamp to the end of the document; characters past the end of a
    /// line clamp to the end of that line.
    pub fn position(&self, line: u32, character: u32) -> Position {
        let Some(start) = self.lines.get(line as usize) else {
            return self.end();
        };
        let line_len = self.line_len(line as usize);
        let character = (character as usize).min(line_len);
        Position::new(start.offset + character, line, character as u32)
    }

    /// Number of characters on `line`, excluding the line break.
    pub fn line_len(&self, line: usize) -> usize {
        let Some(start) = self.lines.get(line) else {
            return 0;
        };
        match self.lines.get(line + 1) {
            Some(next) => next.offset - start.offset - 1,
            None => self.total_chars - start.offset,
        }
    }

    /// Span of a byte range.
    pub fn span_of_bytes(&self, range: Range<usize>) -> Span {
        Span::new(
            self.position_at_byte(range.start),
            self.position_at_byte(range.end),
        )
    }

    /// Span of a character-offset range.
    pub fn span_of_offsets(&self, range: Range<usize>) -> Span {
        Span::new(
            self.position_at_offset(range.start),
            self.position_at_offset(range.end),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn byte_offsets_on_ascii_text() {
        let index = LineIndex::new("# hello\n# tutu\n");
        assert_eq!(index.position_at_byte(0), Position::new(0, 0, 0));
        assert_eq!(index.position_at_byte(8), Position::new(8, 1, 0));
        assert_eq!(index.position_at_byte(14), Position::new(14, 1, 6));
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn accented_characters_count_once() {
        let text = "## ingrédients\nlait";
        let index = LineIndex::new(text);
        let newline = text.find('\n').unwrap();
        // 'é' is two bytes but one character.
        assert_eq!(index.position_at_byte(newline), Position::new(14, 0, 14));
        assert_eq!(index.position_at_byte(newline + 1), Position::new(15, 1, 0));
        assert_eq!(index.line_len(0), 14);
    }

    #[test]
    fn byte_inside_char_snaps_back() {
        let index = LineIndex::new("é");
        assert_eq!(index.position_at_byte(1), Position::new(0, 0, 0));
        assert_eq!(index.position_at_byte(2), Position::new(1, 0, 1));
    }

    #[test]
    fn line_character_pairs_clamp() {
        let index = LineIndex::new("abc\nde");
        assert_eq!(index.position(1, 1), Position::new(5, 1, 1));
        assert_eq!(index.position(0, 99), Position::new(3, 0, 3));
        assert_eq!(index.position(7, 0), Position::new(6, 1, 2));
    }

    #[test]
    fn empty_text_has_one_line() {
        let index = LineIndex::new("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.end(), Position::default());
        assert_eq!(index.position(0, 3), Position::default());
    }

    proptest! {
        #[test]
        fn offsets_and_line_pairs_agree(text in "[a-zé \n]{0,64}", at in 0usize..80) {
            let index = LineIndex::new(&text);
            let pos = index.position_at_offset(at);
            prop_assert_eq!(index.position(pos.line, pos.character), pos);
        }
    }
}
