//! Error types for the loam facade.

use thiserror::Error;

use loam_core::ObjectError;
use loam_graph::GraphError;
use loam_index::IndexError;
use loam_store::StoreError;

/// Errors that can occur during loam operations.
#[derive(Debug, Error)]
pub enum LoamError {
    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Reference resolution error.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Notification or text-index error.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// The submitted document is not a usable object.
    #[error("invalid document: {0}")]
    Document(#[from] ObjectError),

    /// The import payload is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The import payload is not valid YAML.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for loam operations.
pub type Result<T> = std::result::Result<T, LoamError>;
