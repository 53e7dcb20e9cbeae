//! Server configuration.
//!
//! Loaded from a TOML file when one is given, otherwise built from
//! defaults. `PAGERLINE_*` environment variables override either source.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [escalation]
//! response_timeout_secs = 300
//!
//! [notifications.twilio]
//! account_sid = "AC..."
//! auth_token = "..."
//! from_number = "+15550000000"
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use pagerline_alerts::EscalationConfig;
use pagerline_core::config::{
    env_vars, DEFAULT_DATA_DIR, DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
    DEFAULT_HEALTH_CHECK_TIMEOUT_SECS, DEFAULT_HOST, DEFAULT_MESSAGE_TEMPLATE,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_PORT, DEFAULT_RESPONSE_TIMEOUT_SECS,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub escalation: EscalationSettings,
    pub health: HealthSettings,
    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the redb files
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationSettings {
    pub response_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub message_template: String,
}

impl Default for EscalationSettings {
    fn default() -> Self {
        Self {
            response_timeout_secs: DEFAULT_RESPONSE_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
        }
    }
}

impl EscalationSettings {
    pub fn engine_config(&self) -> EscalationConfig {
        EscalationConfig {
            response_timeout: Duration::from_secs(self.response_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            message_template: self.message_template.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthSettings {
    /// Run the periodic health monitor
    pub enabled: bool,
    pub interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
            timeout_secs: DEFAULT_HEALTH_CHECK_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub twilio: Option<TwilioSettings>,
    pub webhook: Option<WebhookSettings>,
    pub console: ConsoleSettings,
}

/// Twilio account used for SMS and voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwilioSettings {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookSettings {
    pub url: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    pub enabled: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Parse a TOML document. Missing sections take their defaults.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("invalid configuration")
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        info!(category = "config", path = %path.display(), "Loading config file");
        Self::from_toml(&content)
    }

    /// Load `path` (or defaults) and apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(env_vars::string);
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, keyed by `PAGERLINE_*` variable name.
    /// Unparseable values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        if let Some(host) = lookup(env_vars::HOST) {
            self.server.host = host;
        }
        if let Some(port) = lookup(env_vars::PORT).and_then(|v| v.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(dir) = lookup(env_vars::DATA_DIR) {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = parsed(env_vars::RESPONSE_TIMEOUT_SECS) {
            self.escalation.response_timeout_secs = secs;
        }
        if let Some(ms) = parsed(env_vars::POLL_INTERVAL_MS) {
            self.escalation.poll_interval_ms = ms;
        }
        if let Some(secs) = parsed(env_vars::HEALTH_CHECK_INTERVAL_SECS) {
            self.health.interval_secs = secs;
        }

        if let (Some(account_sid), Some(auth_token), Some(from_number)) = (
            lookup(env_vars::TWILIO_ACCOUNT_SID),
            lookup(env_vars::TWILIO_AUTH_TOKEN),
            lookup(env_vars::TWILIO_FROM_NUMBER),
        ) {
            let api_base = self.notifications.twilio.as_ref().and_then(|t| t.api_base.clone());
            self.notifications.twilio = Some(TwilioSettings {
                account_sid,
                auth_token,
                from_number,
                api_base,
                enabled: true,
            });
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.escalation.response_timeout_secs == 0 {
            anyhow::bail!("escalation.response_timeout_secs must be positive");
        }
        if self.escalation.poll_interval_ms == 0 {
            anyhow::bail!("escalation.poll_interval_ms must be positive");
        }
        if self.health.interval_secs == 0 {
            anyhow::bail!("health.interval_secs must be positive");
        }
        self.bind_addr()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.server.host, self.server.port))
    }

    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("failed to render configuration")
    }
}
