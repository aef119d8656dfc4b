pub mod check;
pub mod symbols;

use std::path::Path;

use recette_core::Vocabulary;
use recette_dsl::diagnostics::{Diagnostic, Severity, render_diagnostics};
use recette_dsl::Grammar;

/// Read a source file.
fn read_source(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("cannot read {}: {e}", path.display()))
}

/// Load the vocabulary file, or the built-in one when none is given.
fn load_vocabulary(path: Option<&Path>) -> Result<Vocabulary, String> {
    match path {
        Some(path) => Vocabulary::load(path).map_err(|e| e.to_string()),
        None => Ok(Vocabulary::default()),
    }
}

/// The grammar asked for, or the one the file extension implies.
fn grammar_for(path: &Path, requested: Option<Grammar>) -> Grammar {
    requested.unwrap_or_else(|| Grammar::from_extension(path.extension().and_then(|e| e.to_str())))
}

/// Print diagnostics to stderr using ariadne. Returns the number of errors.
fn print_diagnostics(source: &str, path: &Path, diagnostics: &[Diagnostic]) -> usize {
    if diagnostics.is_empty() {
        return 0;
    }

    let filename = path.display().to_string();
    let rendered = render_diagnostics(source, &filename, diagnostics);
    eprint!("{rendered}");

    let count = |severity| diagnostics.iter().filter(|d| d.severity == severity).count();
    let errors = count(Severity::Error);
    let warnings = count(Severity::Warning);

    if errors > 0 {
        eprintln!(
            "  {} error{}, {} warning{}",
            errors,
            if errors == 1 { "" } else { "s" },
            warnings,
            if warnings == 1 { "" } else { "s" },
        );
    } else if warnings > 0 {
        eprintln!(
            "  {} warning{}",
            warnings,
            if warnings == 1 { "" } else { "s" },
        );
    }

    errors
}
