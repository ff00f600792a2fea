//! Question bank import from CSV files.

use learning_core::parser;

use crate::db::Database;
use crate::error::{ApiError, Result};

/// Result of one import run.
#[derive(Debug)]
pub struct ImportOutcome {
    pub loaded: usize,
    pub errors: Vec<String>,
    pub encoding: &'static str,
}

/// Read, decode and parse a bank file, then upsert every parsed question.
/// Row-level problems are reported, not fatal.
pub async fn import_questions_from_path(db: &Database, path: &str) -> Result<ImportOutcome> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::Import(format!("Failed to read {path}: {e}")))?;

    let (content, encoding) = parser::decode_bank(&bytes);
    let bank = parser::parse_bank(&content).map_err(|e| ApiError::Import(e.to_string()))?;

    for question in &bank.questions {
        db.upsert_question(question).await?;
    }

    let errors = bank
        .row_errors
        .iter()
        .map(|e| format!("line {}: {}", e.line, e.message))
        .collect();

    tracing::info!(
        "Imported {} questions from {} ({}), {} rows skipped",
        bank.questions.len(),
        path,
        encoding,
        bank.row_errors.len()
    );

    Ok(ImportOutcome {
        loaded: bank.questions.len(),
        errors,
        encoding,
    })
}
