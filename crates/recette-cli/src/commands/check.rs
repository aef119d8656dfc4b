use std::path::Path;

use recette_dsl::Grammar;
use recette_dsl::diagnostics::sort_by_position;

pub fn run(file: &Path, grammar: Option<Grammar>, vocabulary: Option<&Path>) -> Result<(), String> {
    let vocabulary = super::load_vocabulary(vocabulary)?;
    let source = super::read_source(file)?;
    let grammar = super::grammar_for(file, grammar);

    let mut diagnostics = recette_dsl::check(grammar, &source, &vocabulary);
    sort_by_position(&mut diagnostics);

    let errors = super::print_diagnostics(&source, file, &diagnostics);
    if errors > 0 {
        return Err(format!(
            "{} has {errors} error{}",
            file.display(),
            if errors == 1 { "" } else { "s" }
        ));
    }

    println!("  All checks passed for '{}'.", file.display());
    Ok(())
}
