use indexmap::IndexMap;
use recette_core::{Span, Vocabulary};

use crate::diagnostics::Diagnostic;
use crate::recette::{Recette, Word};

/// Every occurrence of one ingredient name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Symbol {
    /// First declaration in the ingredients section.
    pub definition: Option<Word>,
    /// Later declarations of the same name.
    pub duplicates: Vec<Word>,
    /// Arguments of ingredient verbs naming it.
    pub usages: Vec<Word>,
}

impl Symbol {
    /// Definition, duplicates and usages, in that order.
    pub fn occurrences(&self) -> impl Iterator<Item = &Word> {
        self.definition
            .iter()
            .chain(&self.duplicates)
            .chain(&self.usages)
    }

    fn is_definition(&self, word: &Word) -> bool {
        self.definition.as_ref().is_some_and(|d| d.span == word.span)
    }
}

/// Ingredient names and where they occur.
///
/// Names are kept in the order they were first met, whether as a
/// declaration or as a usage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolIndex {
    symbols: IndexMap<String, Symbol>,
}

impl SymbolIndex {
    /// Build the index in one document-order pass. Usages may precede
    /// their definition.
    pub fn build(recette: &Recette, vocabulary: &Vocabulary) -> Self {
        let mut symbols: IndexMap<String, Symbol> = IndexMap::new();

        for section in &recette.sections {
            let declares = vocabulary.is_ingredients_section(&section.text);
            for sentence in &section.sentences {
                let head = sentence.head();
                if declares {
                    let symbol = symbols.entry(head.value.clone()).or_default();
                    if symbol.definition.is_none() {
                        symbol.definition = Some(head.clone());
                    } else {
                        symbol.duplicates.push(head.clone());
                    }
                } else if vocabulary.needs_ingredients(&head.value) {
                    for word in sentence.arguments() {
                        symbols
                            .entry(word.value.clone())
                            .or_default()
                            .usages
                            .push(word.clone());
                    }
                }
            }
        }

        Self { symbols }
    }

    /// Look up a name.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// All names with their occurrences.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.symbols.iter().map(|(name, symbol)| (name.as_str(), symbol))
    }

    /// Declared names, in the order of their declarations.
    pub fn defined(&self) -> Vec<&str> {
        let mut defined: Vec<(&str, Span)> = self
            .symbols
            .iter()
            .filter_map(|(name, symbol)| symbol.definition.as_ref().map(|d| (name.as_str(), d.span)))
            .collect();
        defined.sort_by_key(|(_, span)| span.start);
        defined.into_iter().map(|(name, _)| name).collect()
    }

    /// Names used by a verb but never declared.
    pub fn undeclared(&self) -> impl Iterator<Item = &str> {
        self.symbols
            .iter()
            .filter(|(_, symbol)| symbol.definition.is_none() && !symbol.usages.is_empty())
            .map(|(name, _)| name.as_str())
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether no ingredient is declared or used.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// Check every sentence against the vocabulary and the index.
pub fn validate(recette: &Recette, index: &SymbolIndex, vocabulary: &Vocabulary) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for section in &recette.sections {
        let declares = vocabulary.is_ingredients_section(&section.text);
        for sentence in &section.sentences {
            let head = sentence.head();
            let arguments = sentence.arguments();

            if declares {
                let is_duplicate = index
                    .get(&head.value)
                    .is_some_and(|symbol| !symbol.is_definition(head));
                if is_duplicate {
                    diagnostics.push(Diagnostic::error(head.span, "duplicated ingredient"));
                }
            } else if vocabulary.needs_ingredients(&head.value) {
                if arguments.is_empty() {
                    diagnostics.push(
                        Diagnostic::error(head.span, "need ingredient(s)")
                            .with_label("name at least one ingredient after this verb"),
                    );
                }
                for word in arguments {
                    let declared = index.get(&word.value).is_some_and(|s| s.definition.is_some());
                    if !declared {
                        diagnostics.push(Diagnostic::error(word.span, "unknown ingredient"));
                    }
                }
            } else if vocabulary.is_verb(&head.value) {
                // Verbs without ingredients take anything.
            } else if vocabulary.is_adverb(&head.value) {
                match arguments {
                    [] => diagnostics.push(Diagnostic::error(head.span, "missing tool")),
                    [tool, extra @ ..] => {
                        if !vocabulary.is_tool(&tool.value) {
                            diagnostics.push(Diagnostic::error(tool.span, "unknown tool"));
                        }
                        if let Some(span) = Span::merge_all(extra.iter().map(|w| w.span)) {
                            diagnostics.push(Diagnostic::warning(span, "too many tools"));
                        }
                    }
                }
            } else {
                diagnostics.push(Diagnostic::error(head.span, "unknown verb or adverb"));
            }
        }
    }

    tracing::trace!(count = diagnostics.len(), "validated sentences");
    diagnostics
}
