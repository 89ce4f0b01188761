//! Error types for notification and indexing.

use thiserror::Error;

/// Errors that can occur while propagating a write downstream.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The index backend rejected or lost the operation.
    #[error("index backend unavailable: {0}")]
    Backend(String),
}

/// Result type for notification and indexing operations.
pub type Result<T> = std::result::Result<T, IndexError>;
