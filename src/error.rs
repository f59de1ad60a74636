//! Error types for question generation and the contest store.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TriviaError {
    /// A query matched no rows where at least one was required
    #[error("No matching records: {0}")]
    EmptyResult(String),

    /// A keyed lookup (year, country) found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Fewer than four distinct answer options could be assembled
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Dataset rejected on import
    #[error("Invalid dataset: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TriviaError {
    /// Whether drawing a different question kind might succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TriviaError::InsufficientData(_))
    }
}

pub type Result<T> = std::result::Result<T, TriviaError>;
