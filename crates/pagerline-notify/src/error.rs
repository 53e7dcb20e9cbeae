//! Error types for notification channels.

use thiserror::Error;

/// Result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No channel registered under that name or for that kind.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Channel is disabled.
    #[error("Channel disabled: {0}")]
    ChannelDisabled(String),

    /// The provider rejected the request or could not be reached.
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The channel cannot deliver this kind of notification.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

