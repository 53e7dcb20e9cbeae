//! Error types for the core crate.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared across the domain layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Persistence layer failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<uuid::Error> for Error {
    fn from(e: uuid::Error) -> Self {
        Error::Validation(format!("Invalid identifier: {}", e))
    }
}
