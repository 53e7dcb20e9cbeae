//! Error types for the storage crate.

use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Storage error types.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Storage/Database error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Not found error.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A row with the same key already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<Error> for pagerline_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Io(e) => pagerline_core::Error::Storage(e.to_string()),
            Error::Serialization(s) => pagerline_core::Error::Serialization(s),
            Error::Storage(s) => pagerline_core::Error::Storage(s),
            Error::NotFound(s) => pagerline_core::Error::NotFound(s),
            Error::AlreadyExists(s) | Error::InvalidInput(s) => pagerline_core::Error::Validation(s),
        }
    }
}

impl From<pagerline_core::Error> for Error {
    fn from(e: pagerline_core::Error) -> Self {
        match e {
            pagerline_core::Error::NotFound(s) => Error::NotFound(s),
            pagerline_core::Error::Validation(s) => Error::InvalidInput(s),
            pagerline_core::Error::Serialization(s) => Error::Serialization(s),
            other => Error::Storage(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<redb::Error> for Error {
    fn from(e: redb::Error) -> Self {
        Error::Storage(format!("Redb error: {}", e))
    }
}

impl From<redb::TransactionError> for Error {
    fn from(e: redb::TransactionError) -> Self {
        Error::Storage(format!("Redb transaction error: {}", e))
    }
}

impl From<redb::TableError> for Error {
    fn from(e: redb::TableError) -> Self {
        Error::Storage(format!("Redb table error: {}", e))
    }
}

impl From<redb::StorageError> for Error {
    fn from(e: redb::StorageError) -> Self {
        Error::Storage(format!("Redb storage error: {}", e))
    }
}

impl From<redb::CommitError> for Error {
    fn from(e: redb::CommitError) -> Self {
        Error::Storage(format!("Redb commit error: {}", e))
    }
}

impl From<redb::DatabaseError> for Error {
    fn from(e: redb::DatabaseError) -> Self {
        Error::Storage(format!("Redb database error: {}", e))
    }
}
