//! Console notification channel.

use async_trait::async_trait;

use pagerline_core::ChannelKind;

use super::NotificationChannel;
use crate::{Error, Result};

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Clone)]
pub struct ConsoleChannel {
    name: String,
    enabled: bool,
}

impl ConsoleChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[async_trait]
impl NotificationChannel for ConsoleChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &str {
        "console"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, kind: ChannelKind, to: &str, message: &str) -> Result<()> {
        if !self.enabled {
            return Err(Error::ChannelDisabled(self.name.clone()));
        }
        tracing::info!(channel = %kind, to, message, "Notification (console)");
        Ok(())
    }
}

pub struct ConsoleChannelFactory;

impl super::ChannelFactory for ConsoleChannelFactory {
    fn channel_type(&self) -> &str {
        "console"
    }

    fn create(&self, config: &serde_json::Value) -> Result<std::sync::Arc<dyn NotificationChannel>> {
        let name = config
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("console");

        let mut channel = ConsoleChannel::new(name);
        if !config.get("enabled").and_then(|v| v.as_bool()).unwrap_or(true) {
            channel = channel.disabled();
        }
        Ok(std::sync::Arc::new(channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ChannelFactory;

    #[tokio::test]
    async fn test_console_send() {
        let channel = ConsoleChannel::new("console");
        assert!(channel.send(ChannelKind::Sms, "+1555", "hello").await.is_ok());

        let disabled = ConsoleChannel::new("off").disabled();
        assert!(disabled.send(ChannelKind::Sms, "+1555", "hello").await.is_err());
    }

    #[test]
    fn test_console_factory() {
        let channel = ConsoleChannelFactory
            .create(&serde_json::json!({"enabled": false}))
            .unwrap();
        assert_eq!(channel.name(), "console");
        assert!(!channel.is_enabled());
    }
}
