use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// A location in a document.
///
/// `offset` counts characters (not bytes) from the start of the document;
/// `line` and `character` are zero-based. Positions built from the same text
/// order by `offset`, which agrees with `(line, character)` ordering, so the
/// derived `Ord` (offset first) is the document order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Character offset from the start of the document.
    pub offset: usize,
    /// Zero-based line number.
    pub line: u32,
    /// Zero-based character index within the line.
    pub character: u32,
}

impl Position {
    /// Create a position from its three coordinates.
    pub fn new(offset: usize, line: u32, character: u32) -> Self {
        Self {
            offset,
            line,
            character,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.character)
    }
}

/// A half-open range `[start, end)` of a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// First position covered by the span.
    pub start: Position,
    /// Position just past the last covered character.
    pub end: Position,
}

impl Span {
    /// Create a span. `start` must not come after `end`.
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(start.offset <= end.offset, "span start after end");
        Self { start, end }
    }

    /// A zero-width span at `at`.
    pub fn empty(at: Position) -> Self {
        Self { start: at, end: at }
    }

    /// The smallest span containing both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Merge every span of the iterator. Returns `None` when it is empty.
    pub fn merge_all(spans: impl IntoIterator<Item = Span>) -> Option<Span> {
        spans.into_iter().reduce(Span::merge)
    }

    /// Half-open containment: `start <= pos < end`.
    pub fn contains(&self, pos: Position) -> bool {
        self.start.offset <= pos.offset && pos.offset < self.end.offset
    }

    /// Like [`Span::contains`] but also accepts the end position, which is
    /// where the caret sits right after typing the last character.
    pub fn touches(&self, pos: Position) -> bool {
        self.start.offset <= pos.offset && pos.offset <= self.end.offset
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn encloses(&self, other: &Span) -> bool {
        self.start.offset <= other.start.offset && other.end.offset <= self.end.offset
    }

    /// Number of characters covered.
    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    /// Whether the span covers no character.
    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    /// The span as a character-offset range.
    pub fn offsets(&self) -> Range<usize> {
        self.start.offset..self.end.offset
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
