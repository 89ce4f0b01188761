//! Error types for graph transforms.

use thiserror::Error;

/// Errors that can occur while resolving references.
///
/// Normalization and template substitution are pure and infallible; only
/// denormalization can fail, and only because the store did.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Storage error while resolving a reference.
    #[error("storage error: {0}")]
    Store(#[from] loam_store::StoreError),
}

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
