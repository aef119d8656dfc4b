use std::path::Path;

use recette_core::Position;
use recette_dsl::Grammar;
use recette_dsl::resolver::Symbol;

fn status(symbol: &Symbol) -> &'static str {
    if symbol.definition.is_none() {
        "undeclared"
    } else if !symbol.duplicates.is_empty() {
        "duplicated"
    } else if symbol.usages.is_empty() {
        "unused"
    } else {
        "ok"
    }
}

/// One-based `line:column` for people reading a terminal.
fn human(position: Position) -> String {
    format!("{}:{}", position.line + 1, position.character + 1)
}

pub fn run(file: &Path, grammar: Option<Grammar>, vocabulary: Option<&Path>, json: bool) -> Result<(), String> {
    let vocabulary = super::load_vocabulary(vocabulary)?;
    let source = super::read_source(file)?;

    match super::grammar_for(file, grammar) {
        Grammar::Recette => {
            let analysis = recette_dsl::analyze(&source, &vocabulary);
            if json {
                let symbols: Vec<_> = analysis
                    .index
                    .iter()
                    .map(|(name, symbol)| {
                        serde_json::json!({
                            "name": name,
                            "definition": symbol.definition.as_ref().map(|w| w.span.start),
                            "duplicates": symbol.duplicates.len(),
                            "usages": symbol.usages.len(),
                            "status": status(symbol),
                        })
                    })
                    .collect();
                let out = serde_json::to_string_pretty(&symbols).map_err(|e| e.to_string())?;
                println!("{out}");
                return Ok(());
            }

            if analysis.index.is_empty() {
                println!("  No ingredients.");
                return Ok(());
            }
            println!("  {:<20} {:<10} {:>5}  STATUS", "INGREDIENT", "DEFINED", "USES");
            for (name, symbol) in analysis.index.iter() {
                let defined = symbol
                    .definition
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |w| human(w.span.start));
                println!(
                    "  {:<20} {:<10} {:>5}  {}",
                    name,
                    defined,
                    symbol.usages.len(),
                    status(symbol)
                );
            }
        }
        Grammar::Asm => {
            let assembly = recette_dsl::assemble(&source);
            if json {
                let labels: Vec<_> = assembly
                    .program
                    .labels()
                    .map(|label| serde_json::json!({ "name": label.node, "position": label.span.start }))
                    .collect();
                let out = serde_json::to_string_pretty(&labels).map_err(|e| e.to_string())?;
                println!("{out}");
                return Ok(());
            }

            println!("  {:<20} DEFINED", "LABEL");
            for label in assembly.program.labels() {
                println!("  {:<20} {}", label.node, human(label.span.start));
            }
        }
    }

    Ok(())
}
