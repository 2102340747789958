//! Error types for memrank.

use thiserror::Error;

use crate::embedding::ProviderError;

/// Main error type for memrank operations.
///
/// Expected conditions (a missing id, a dimension mismatch during similarity
/// scoring) are encoded in return values and never show up here.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite error.
    #[error("SQLite error: {0}")]
    SQLite(#[from] rusqlite::Error),

    /// Persisted data could not be decoded (corrupt blob, JSON or timestamp).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Embedding provider failed; nothing was written.
    #[error("Embedding provider error: {0}")]
    Provider(#[from] ProviderError),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid date/time.
    #[error("Invalid date/time: {0}")]
    Chrono(#[from] chrono::ParseError),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Empty or whitespace-only content.
    #[error("Input cannot be empty")]
    EmptyInput,

    /// Content exceeds the maximum length.
    #[error("Input too long: {actual_length} bytes (max {max_length})")]
    InputTooLong {
        max_length: usize,
        actual_length: usize,
    },

    /// Limit outside the accepted range.
    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    /// Operation requires a capability the store was not opened with.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The store was closed; the handle can no longer be used.
    #[error("Store is closed")]
    StoreClosed,

    /// Memory not found (CLI only; the library returns `None`).
    #[error("Memory not found: {0}")]
    NotFound(String),
}
