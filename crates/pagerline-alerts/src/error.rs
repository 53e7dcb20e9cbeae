//! Error types for the alerts crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Notification error: {0}")]
    Notify(#[from] pagerline_notify::Error),

    #[error("Health probe error: {0}")]
    Probe(String),
}

impl From<pagerline_storage::Error> for Error {
    fn from(e: pagerline_storage::Error) -> Self {
        match e {
            pagerline_storage::Error::NotFound(s) => Error::NotFound(s),
            pagerline_storage::Error::InvalidInput(s) | pagerline_storage::Error::AlreadyExists(s) => {
                Error::Validation(s)
            }
            other => Error::Storage(other.to_string()),
        }
    }
}

impl From<pagerline_core::Error> for Error {
    fn from(e: pagerline_core::Error) -> Self {
        match e {
            pagerline_core::Error::NotFound(s) => Error::NotFound(s),
            pagerline_core::Error::Validation(s) => Error::Validation(s),
            other => Error::Storage(other.to_string()),
        }
    }
}
