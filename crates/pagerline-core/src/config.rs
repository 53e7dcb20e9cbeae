//! Shared configuration defaults.
//!
//! Constants and environment helpers used by more than one crate, so the
//! server, the engine and the health monitor agree on the same defaults.

/// Escalation timing defaults
pub mod escalation {
    /// Seconds to wait for a response after each attempt
    pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 300;
    /// Milliseconds between acknowledgment store polls
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
    /// Message sent to each on-call user
    pub const DEFAULT_MESSAGE_TEMPLATE: &str = "Service alert: {service} is down";
}

/// Health monitor defaults
pub mod health {
    pub const DEFAULT_HEALTH_CHECK_INTERVAL_SECS: u64 = 60;
    pub const DEFAULT_HEALTH_CHECK_TIMEOUT_SECS: u64 = 10;
}

/// Server defaults
pub mod server {
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    pub const DEFAULT_PORT: u16 = 8080;
    pub const DEFAULT_DATA_DIR: &str = "data";
}

pub use escalation::{DEFAULT_MESSAGE_TEMPLATE, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RESPONSE_TIMEOUT_SECS};
pub use health::{DEFAULT_HEALTH_CHECK_INTERVAL_SECS, DEFAULT_HEALTH_CHECK_TIMEOUT_SECS};
pub use server::{DEFAULT_DATA_DIR, DEFAULT_HOST, DEFAULT_PORT};

/// Environment variable names and readers
pub mod env_vars {
    pub const HOST: &str = "PAGERLINE_HOST";
    pub const PORT: &str = "PAGERLINE_PORT";
    pub const DATA_DIR: &str = "PAGERLINE_DATA_DIR";
    pub const RESPONSE_TIMEOUT_SECS: &str = "PAGERLINE_RESPONSE_TIMEOUT_SECS";
    pub const POLL_INTERVAL_MS: &str = "PAGERLINE_POLL_INTERVAL_MS";
    pub const HEALTH_CHECK_INTERVAL_SECS: &str = "PAGERLINE_HEALTH_CHECK_INTERVAL_SECS";
    pub const TWILIO_ACCOUNT_SID: &str = "PAGERLINE_TWILIO_ACCOUNT_SID";
    pub const TWILIO_AUTH_TOKEN: &str = "PAGERLINE_TWILIO_AUTH_TOKEN";
    pub const TWILIO_FROM_NUMBER: &str = "PAGERLINE_TWILIO_FROM_NUMBER";
    pub const LOG_JSON: &str = "PAGERLINE_LOG_JSON";

    /// Read a string variable, ignoring empty values.
    pub fn string(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|s| !s.trim().is_empty())
    }

    /// Whether logs should be emitted as JSON.
    pub fn log_json() -> bool {
        std::env::var(LOG_JSON)
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }
}
