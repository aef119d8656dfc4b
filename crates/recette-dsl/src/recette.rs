//! The recipe grammar: a title, sections, and one sentence per line.
//!
//! Lines are classified by a small state machine. A line whose first
//! non-blank character is `#` is a header: one `#` makes a title, more make
//! a section. Every other non-blank line is a sentence of blank-separated
//! words.

use recette_core::{LineIndex, Span};

use crate::diagnostics::Diagnostic;

/// A parsed recipe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recette {
    /// The first `#` header, if any.
    pub title: Option<Title>,
    /// Sections in document order. Headers rejected by the parser are absent.
    pub sections: Vec<Section>,
}

/// The recipe title.
#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    /// From the first `#` to the last non-blank character of the line.
    pub span: Span,
    /// Header text without the `#` run, trimmed.
    pub text: String,
}

/// A header-delimited block of sentences.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Span of the header.
    pub span: Span,
    /// Header text without the `#` run, trimmed.
    pub text: String,
    /// Sentences in document order.
    pub sentences: Vec<Sentence>,
}

/// One line of words.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    /// From the first word's start to the last word's end.
    pub span: Span,
    /// Never empty.
    pub words: Vec<Word>,
}

/// A maximal run of non-blank characters.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    /// Where the word was written.
    pub span: Span,
    /// The word text.
    pub value: String,
}

impl Sentence {
    /// The first word: a verb, an adverb, or an ingredient name.
    pub fn head(&self) -> &Word {
        &self.words[0]
    }

    /// The words after the head.
    pub fn arguments(&self) -> &[Word] {
        &self.words[1..]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    Start,
    Header,
    OnWord,
    OffWord,
}

#[derive(Debug, PartialEq)]
enum Line {
    Blank,
    Header {
        depth: usize,
        start: usize,
        end: usize,
        text: String,
    },
    Words(Vec<(usize, usize)>),
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}

/// Classify one line. Columns are character indices.
fn scan_line(content: &str) -> Line {
    let mut state = LineState::Start;
    let mut depth = 0;
    let mut counting = false;
    let mut header_start = 0;
    let mut header_end = 0;
    let mut text_start = None;
    let mut word_start = 0;
    let mut words = Vec::new();
    let mut len = 0;

    for (column, c) in content.chars().enumerate() {
        len = column + 1;
        match state {
            LineState::Start => {
                if c == '#' {
                    state = LineState::Header;
                    depth = 1;
                    counting = true;
                    header_start = column;
                    header_end = column + 1;
                } else if !is_blank(c) {
                    state = LineState::OnWord;
                    word_start = column;
                }
            }
            LineState::Header => {
                if c == '#' && counting {
                    depth += 1;
                } else {
                    counting = false;
                }
                if !is_blank(c) {
                    header_end = column + 1;
                    if !counting && text_start.is_none() {
                        text_start = Some(column);
                    }
                }
            }
            LineState::OnWord => {
                if is_blank(c) {
                    words.push((word_start, column));
                    state = LineState::OffWord;
                }
            }
            LineState::OffWord => {
                if !is_blank(c) {
                    word_start = column;
                    state = LineState::OnWord;
                }
            }
        }
    }

    match state {
        LineState::Start => Line::Blank,
        LineState::Header => {
            let text = match text_start {
                Some(from) => content.chars().skip(from).take(header_end - from).collect(),
                None => String::new(),
            };
            Line::Header {
                depth,
                start: header_start,
                end: header_end,
                text,
            }
        }
        LineState::OnWord => {
            words.push((word_start, len));
            Line::Words(words)
        }
        LineState::OffWord => Line::Words(words),
    }
}

fn slice_chars(content: &str, start: usize, end: usize) -> String {
    content.chars().skip(start).take(end - start).collect()
}

/// Parse a recipe, returning the tree and the structural diagnostics.
pub fn parse(index: &LineIndex<'_>) -> (Recette, Vec<Diagnostic>) {
    let mut recette = Recette::default();
    let mut diagnostics = Vec::new();

    for (number, content) in index.text().split('\n').enumerate() {
        let line = number as u32;
        let span = |start: usize, end: usize| {
            Span::new(
                index.position(line, start as u32),
                index.position(line, end as u32),
            )
        };

        match scan_line(content) {
            Line::Blank => {}
            Line::Header {
                depth,
                start,
                end,
                text,
            } => {
                let span = span(start, end);
                if depth == 1 {
                    if recette.title.is_some() {
                        diagnostics.push(Diagnostic::error(span, "title already defined"));
                    } else {
                        recette.title = Some(Title { span, text });
                    }
                } else if recette.title.is_none() {
                    diagnostics.push(Diagnostic::error(span, "must come after title"));
                } else {
                    recette.sections.push(Section {
                        span,
                        text,
                        sentences: Vec::new(),
                    });
                }
            }
            Line::Words(ranges) => {
                let words: Vec<Word> = ranges
                    .into_iter()
                    .map(|(start, end)| Word {
                        span: span(start, end),
                        value: slice_chars(content, start, end),
                    })
                    .collect();
                let Some(sentence_span) = Span::merge_all(words.iter().map(|w| w.span)) else {
                    continue;
                };
                match recette.sections.last_mut() {
                    Some(section) => section.sentences.push(Sentence {
                        span: sentence_span,
                        words,
                    }),
                    None => diagnostics.push(Diagnostic::error(sentence_span, "must be in a section")),
                }
            }
        }
    }

    (recette, diagnostics)
}
