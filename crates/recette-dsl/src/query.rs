//! Position-based queries over an analysed recipe: completion and rename.

use recette_core::{Position, Span, Vocabulary};

use crate::Analysis;
use crate::recette::{Recette, Section, Sentence, Word};

/// What lies under a position.
#[derive(Debug, Clone, Copy)]
pub struct Location<'a> {
    /// The section containing the position's line.
    pub section: &'a Section,
    /// The sentence written on the position's line, if any.
    pub sentence: Option<&'a Sentence>,
    /// Index of the first word ending at or after the position, or the
    /// number of words when the position is past the last one.
    pub word_index: Option<usize>,
}

impl<'a> Location<'a> {
    /// The word the position touches, if any.
    pub fn word(&self, position: Position) -> Option<&'a Word> {
        let word = self.sentence?.words.get(self.word_index?)?;
        word.span.touches(position).then_some(word)
    }
}

/// Find the section, sentence and word index for `position`. Returns `None`
/// before the first section.
pub fn locate(recette: &Recette, position: Position) -> Option<Location<'_>> {
    let section = recette
        .sections
        .iter()
        .rev()
        .find(|s| s.span.start.line <= position.line)?;
    let sentence = section
        .sentences
        .iter()
        .find(|s| s.span.start.line == position.line);
    let word_index = sentence.map(|s| {
        s.words
            .iter()
            .position(|w| position.character <= w.span.end.character)
            .unwrap_or(s.words.len())
    });
    Some(Location {
        section,
        sentence,
        word_index,
    })
}

/// How a completion item is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// A verb.
    Function,
    /// An adverb.
    Operator,
    /// A tool.
    Class,
    /// An ingredient.
    Field,
}

/// One completion proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    /// Text to insert.
    pub label: String,
    /// Presentation kind.
    pub kind: CompletionKind,
}

fn items<'a>(words: impl IntoIterator<Item = &'a str>, kind: CompletionKind) -> Vec<CompletionItem> {
    words
        .into_iter()
        .map(|label| CompletionItem {
            label: label.to_string(),
            kind,
        })
        .collect()
}

/// Propose words for `position`. Never fails; every position gets a list.
pub fn complete(analysis: &Analysis, vocabulary: &Vocabulary, position: Position) -> Vec<CompletionItem> {
    let heads = || {
        let mut proposals = items(vocabulary.verbs.iter().map(String::as_str), CompletionKind::Function);
        proposals.extend(items(vocabulary.adverbs.iter().map(String::as_str), CompletionKind::Operator));
        proposals
    };

    let Some(location) = locate(&analysis.recette, position) else {
        return heads();
    };

    if vocabulary.is_ingredients_section(&location.section.text) {
        return items(analysis.index.undeclared(), CompletionKind::Field);
    }

    match (location.sentence, location.word_index) {
        (Some(sentence), Some(index)) if index > 0 => {
            if vocabulary.needs_ingredients(&sentence.head().value) {
                items(analysis.index.defined(), CompletionKind::Field)
            } else {
                items(vocabulary.tools.iter().map(String::as_str), CompletionKind::Class)
            }
        }
        _ => heads(),
    }
}

/// Span of the word at `position` if it can be renamed: an argument of an
/// ingredient verb.
pub fn prepare_rename(analysis: &Analysis, vocabulary: &Vocabulary, position: Position) -> Option<Span> {
    let location = locate(&analysis.recette, position)?;
    if vocabulary.is_ingredients_section(&location.section.text) {
        return None;
    }
    let sentence = location.sentence?;
    if location.word_index? == 0 || !vocabulary.needs_ingredients(&sentence.head().value) {
        return None;
    }
    location.word(position).map(|word| word.span)
}

/// A replacement of one span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// What to replace.
    pub span: Span,
    /// The replacement.
    pub new_text: String,
}

/// Rename failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenameError {
    /// The new name is empty, would split into several words, or would
    /// turn its line into a header.
    #[error("\"{0}\" is not a valid ingredient name")]
    InvalidName(String),
}

/// Edits renaming the ingredient under `position` to `new_name`: its
/// definition, every duplicate and every usage. An unknown name or a
/// position on no word gives no edit.
pub fn rename(analysis: &Analysis, position: Position, new_name: &str) -> Result<Vec<TextEdit>, RenameError> {
    if !is_valid_name(new_name) {
        return Err(RenameError::InvalidName(new_name.to_string()));
    }
    let Some(word) = locate(&analysis.recette, position).and_then(|l| l.word(position)) else {
        return Ok(Vec::new());
    };
    let Some(symbol) = analysis.index.get(&word.value) else {
        return Ok(Vec::new());
    };

    let mut edits: Vec<TextEdit> = symbol
        .occurrences()
        .map(|w| TextEdit {
            span: w.span,
            new_text: new_name.to_string(),
        })
        .collect();
    edits.sort_by_key(|e| e.span.start);
    tracing::debug!(from = %word.value, to = new_name, edits = edits.len(), "rename");
    Ok(edits)
}

/// A name that the line scanner reads back as exactly one word.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('#') && !name.chars().any(char::is_whitespace)
}

/// Apply non-overlapping edits to `text`.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut sorted: Vec<&TextEdit> = edits.iter().collect();
    sorted.sort_by_key(|e| e.span.start);

    let mut chars = text.chars();
    let mut out = String::with_capacity(text.len());
    let mut at = 0;
    for edit in sorted {
        let range = edit.span.offsets();
        out.extend(chars.by_ref().take(range.start.saturating_sub(at)));
        chars.by_ref().take(range.len()).for_each(drop);
        out.push_str(&edit.new_text);
        at = range.end.max(at);
    }
    out.extend(chars);
    out
}
