//! Analysis engine for the recipe language and the assembler grammar.
//!
//! [`analyze`] turns recipe text into a tree, a symbol index and
//! diagnostics. [`assemble`] does the same for assembler sources. Both are
//! pure: every call builds fresh data from the text alone.

/// Syntax tree of the assembler grammar.
pub mod ast;
/// Diagnostics and their terminal rendering.
pub mod diagnostics;
/// Assembler tokenizer.
pub mod lexer;
/// Assembler parser.
pub mod parser;
pub mod query;
pub mod recette;
/// Ingredient index and sentence validation.
pub mod resolver;

use recette_core::{LineIndex, Vocabulary};

pub use diagnostics::{Diagnostic, Severity};
pub use query::{CompletionItem, CompletionKind, RenameError, TextEdit};
pub use recette::Recette;
pub use resolver::SymbolIndex;

/// Result of analysing a recipe.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// The parsed tree.
    pub recette: Recette,
    /// Ingredient names and their occurrences.
    pub index: SymbolIndex,
    /// Structural diagnostics followed by validation diagnostics, unsorted.
    pub diagnostics: Vec<Diagnostic>,
}

/// Analyse recipe text.
pub fn analyze(text: &str, vocabulary: &Vocabulary) -> Analysis {
    let line_index = LineIndex::new(text);
    let (recette, mut diagnostics) = recette::parse(&line_index);
    let index = SymbolIndex::build(&recette, vocabulary);
    diagnostics.extend(resolver::validate(&recette, &index, vocabulary));

    tracing::debug!(
        sections = recette.sections.len(),
        symbols = index.len(),
        diagnostics = diagnostics.len(),
        "analysed recette"
    );

    Analysis {
        recette,
        index,
        diagnostics,
    }
}

/// Result of parsing an assembler source.
#[derive(Debug, Clone)]
pub struct Assembly {
    /// Statements of every line that parsed.
    pub program: ast::Program,
    /// Lexer errors followed by syntax errors.
    pub diagnostics: Vec<Diagnostic>,
}

/// Lex and parse an assembler source.
pub fn assemble(text: &str) -> Assembly {
    let line_index = LineIndex::new(text);
    let (tokens, lex_errors) = lexer::lex(text);

    let mut diagnostics: Vec<Diagnostic> = lex_errors
        .into_iter()
        .map(|e| Diagnostic::error(e.span, e.message))
        .collect();

    let (program, syntax_errors) = parser::parse(&line_index, &tokens);
    diagnostics.extend(
        syntax_errors
            .into_iter()
            .map(|e| Diagnostic::error(e.span, e.to_string())),
    );

    tracing::debug!(
        statements = program.statements.len(),
        diagnostics = diagnostics.len(),
        "assembled"
    );

    Assembly {
        program,
        diagnostics,
    }
}

/// Which grammar a document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    /// The recipe language.
    Recette,
    /// The assembler grammar.
    Asm,
}

impl Grammar {
    /// Pick a grammar from a file extension: `mac` and `asm` are assembler,
    /// anything else is a recipe.
    pub fn from_extension(extension: Option<&str>) -> Self {
        match extension.map(str::to_ascii_lowercase).as_deref() {
            Some("mac" | "asm") => Grammar::Asm,
            _ => Grammar::Recette,
        }
    }
}

/// Diagnostics for `text` in the given grammar.
pub fn check(grammar: Grammar, text: &str, vocabulary: &Vocabulary) -> Vec<Diagnostic> {
    match grammar {
        Grammar::Recette => analyze(text, vocabulary).diagnostics,
        Grammar::Asm => assemble(text).diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_full_recipe() {
        let source = "\
# Gâteau au chocolat
## ingrédients
chocolat
beurre
## étapes
fondre chocolat beurre
verser chocolat
dans plat
cuire
";
        let analysis = analyze(source, &Vocabulary::default());
        assert!(analysis.diagnostics.is_empty(), "{:?}", analysis.diagnostics);
        assert_eq!(
            analysis.recette.title.as_ref().map(|t| t.text.as_str()),
            Some("Gâteau au chocolat")
        );
        assert_eq!(analysis.index.defined(), vec!["chocolat", "beurre"]);
    }

    #[test]
    fn analyze_reports_unknown_ingredient_in_verb_arguments() {
        let source = "# t\n## étapes\nverser chocolat dans\n";
        let analysis = analyze(source, &Vocabulary::default());
        let messages: Vec<_> = analysis.diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["unknown ingredient", "unknown ingredient"]);
    }

    #[test]
    fn assemble_collects_lex_and_syntax_errors() {
        let assembly = assemble("START: MOV #1, R0 ?\nCLR )\nADD ,\n.ASCII /open");
        let messages: Vec<_> = assembly.diagnostics.iter().map(|d| d.message.clone()).collect();
        assert_eq!(messages.len(), 4, "{messages:?}");
        assert!(messages[0].starts_with("unexpected characters"));
        assert_eq!(messages[1], "unterminated string");
        assert!(messages[2].starts_with("line 2:"));
        assert!(messages[3].starts_with("line 3:"));
    }

    #[test]
    fn assemble_clean_source() {
        let assembly = assemble("; hello\nMSG: .ASCIZ \"hi\"\nSTART: MOV #MSG, R1\n  JSR PC, PRINT\n  .END START\n");
        assert!(assembly.diagnostics.is_empty(), "{:?}", assembly.diagnostics);
        assert_eq!(assembly.program.labels().count(), 2);
    }

    #[test]
    fn grammar_from_extension() {
        assert_eq!(Grammar::from_extension(Some("MAC")), Grammar::Asm);
        assert_eq!(Grammar::from_extension(Some("asm")), Grammar::Asm);
        assert_eq!(Grammar::from_extension(Some("rct")), Grammar::Recette);
        assert_eq!(Grammar::from_extension(None), Grammar::Recette);
    }

    #[test]
    fn check_dispatches_on_grammar() {
        let vocabulary = Vocabulary::default();
        assert_eq!(check(Grammar::Recette, "## s\n", &vocabulary).len(), 1);
        assert_eq!(check(Grammar::Asm, "## s\n", &vocabulary).len(), 1);
        assert!(check(Grammar::Asm, "CLR R0\n", &vocabulary).is_empty());
    }
}
