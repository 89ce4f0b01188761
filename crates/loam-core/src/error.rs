//! Error types for the core data model.

use thiserror::Error;

/// Errors that can occur when interpreting a JSON value as a stored object.
#[derive(Debug, Error)]
pub enum ObjectError {
    /// The value is not a JSON object.
    #[error("not a JSON object")]
    NotAnObject,

    /// The `type` field is missing or empty.
    #[error("missing or empty type tags")]
    MissingTypes,

    /// The value has the right keys but the wrong shapes.
    #[error("malformed object: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, ObjectError>;
