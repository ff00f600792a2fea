//! Error types for learning-core.

use thiserror::Error;

/// Result type alias using ImportError.
pub type Result<T> = std::result::Result<T, ImportError>;

/// Errors that abort a question bank import. Bad individual rows do not
/// abort the import; they are collected as [`crate::parser::RowError`]s.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("empty file")]
    EmptyFile,

    #[error("missing required column {0}")]
    MissingColumn(&'static str),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
