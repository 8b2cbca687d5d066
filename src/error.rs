//! Error types for frigo operations.

use thiserror::Error;

/// Unified error type for inventory, storage and import/export operations.
#[derive(Debug, Error)]
pub enum FrigoError {
    /// Durable storage could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite backend failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Malformed JSON payload
    #[error("Invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed CSV payload
    #[error("Invalid CSV payload: {0}")]
    Csv(#[from] csv::Error),

    /// Payload parsed but is not a recognized shape
    #[error("Unsupported payload shape: {0}")]
    Payload(String),

    /// Import payload parsed but produced no usable record
    #[error("No usable record in import payload ({skipped} skipped)")]
    EmptyImport { skipped: usize },

    /// Requested item id does not exist
    #[error("No inventory item with id {0}")]
    NotFound(String),

    /// Exit quantity exceeds available stock
    #[error("Cannot take {requested} of '{name}': only {available} in stock")]
    InsufficientStock {
        name: String,
        requested: u32,
        available: u32,
    },

    /// Exit quantity must be at least 1
    #[error("Exit quantity must be at least 1")]
    ZeroExit,
}

/// Result alias for frigo operations
pub type Result<T> = std::result::Result<T, FrigoError>;
