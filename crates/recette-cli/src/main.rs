//! CLI frontend for the Recette language service.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use recette_dsl::Grammar;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "recette",
    about = "Recette: diagnostics and symbols for recipes and assembler sources",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum GrammarArg {
    /// Recipe language
    Recette,
    /// Assembler sources
    Asm,
}

impl From<GrammarArg> for Grammar {
    fn from(arg: GrammarArg) -> Self {
        match arg {
            GrammarArg::Recette => Grammar::Recette,
            GrammarArg::Asm => Grammar::Asm,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a file and report diagnostics
    Check {
        /// File to check
        file: PathBuf,

        /// Grammar to use (default: from the file extension)
        #[arg(short, long, value_enum)]
        grammar: Option<GrammarArg>,

        /// JSON vocabulary file replacing the built-in word lists
        #[arg(long)]
        vocabulary: Option<PathBuf>,
    },

    /// List ingredients of a recipe, or labels of an assembler source
    Symbols {
        /// File to inspect
        file: PathBuf,

        /// Grammar to use (default: from the file extension)
        #[arg(short, long, value_enum)]
        grammar: Option<GrammarArg>,

        /// JSON vocabulary file replacing the built-in word lists
        #[arg(long)]
        vocabulary: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Start the Language Server Protocol server (for IDE integration)
    Lsp,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            file,
            grammar,
            vocabulary,
        } => commands::check::run(&file, grammar.map(Grammar::from), vocabulary.as_deref()),
        Commands::Symbols {
            file,
            grammar,
            vocabulary,
            json,
        } => commands::symbols::run(&file, grammar.map(Grammar::from), vocabulary.as_deref(), json),
        Commands::Lsp => {
            // Exec the separate recette-lsp binary
            let status = std::process::Command::new("recette-lsp")
                .stdin(std::process::Stdio::inherit())
                .stdout(std::process::Stdio::inherit())
                .stderr(std::process::Stdio::inherit())
                .status();
            match status {
                Ok(s) if s.success() => Ok(()),
                Ok(s) => Err(format!("recette-lsp exited with {s}")),
                Err(_) => Err(
                    "recette-lsp binary not found. Install it with: cargo install --path crates/recette-lsp"
                        .into(),
                ),
            }
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
