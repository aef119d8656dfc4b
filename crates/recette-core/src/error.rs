use std::path::PathBuf;

/// Alias for `Result<T, RecetteError>`.
pub type RecetteResult<T> = Result<T, RecetteError>;

/// Errors raised while loading configuration.
///
/// Analysis itself never fails; problems in a document are reported as
/// diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum RecetteError {
    /// A configuration file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A vocabulary file is not valid JSON or has the wrong shape.
    #[error("malformed vocabulary: {0}")]
    Json(#[from] serde_json::Error),

    /// A vocabulary parsed but breaks one of its own rules.
    #[error("invalid vocabulary: {0}")]
    InvalidVocabulary(String),
}
