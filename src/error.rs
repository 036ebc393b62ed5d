//! Error types for the topic analysis pipeline.

use thiserror::Error;

/// Errors raised while loading, vectorizing, factorizing or analyzing a corpus.
#[derive(Debug, Error)]
pub enum TopicError {
    /// Two inputs that must share a dimension disagree
    #[error("Shape mismatch in {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A topic column or document row lies outside its valid range
    #[error("Invalid {what} index {index} (valid range is 0..{len})")]
    InvalidIndex {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Zero documents or zero terms reached a component that needs at least one
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    /// The requested text column is not in the corpus header
    #[error("Column not found in corpus header: {0}")]
    MissingColumn(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TopicError>;
