//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Object serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A batch record has no canonical URL.
    #[error("record {0} in batch has no url")]
    MissingUrl(usize),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// The storage backend is unavailable (poisoned lock, dead worker).
    #[error("storage backend unavailable: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
