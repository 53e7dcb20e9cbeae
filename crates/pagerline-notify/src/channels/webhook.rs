//! Webhook notification channel.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use pagerline_core::ChannelKind;

use super::NotificationChannel;
use crate::{Error, Result};

/// Posts each notification as JSON to a URL, leaving delivery to the
/// receiving service.
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    name: String,
    enabled: bool,
    url: String,
    headers: HashMap<String, String>,
    client: reqwest::Client,
}

impl WebhookChannel {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            url: url.into(),
            headers: HashMap::new(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, kind: ChannelKind, to: &str, message: &str) -> Result<()> {
        if !self.enabled {
            return Err(Error::ChannelDisabled(self.name.clone()));
        }

        let mut request = self.client.post(&self.url);
        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        let body = serde_json::json!({
            "channel": kind,
            "to": to,
            "message": message,
            "timestamp": chrono::Utc::now().timestamp(),
        });

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::SendFailed(format!("Webhook request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::SendFailed(format!(
                "Webhook returned error: {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn get_config(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({ "url": self.url }))
    }
}

pub struct WebhookChannelFactory;

impl super::ChannelFactory for WebhookChannelFactory {
    fn channel_type(&self) -> &str {
        "webhook"
    }

    fn create(&self, config: &serde_json::Value) -> Result<Arc<dyn NotificationChannel>> {
        let url = config
            .get("url")
            .and_then(|v| v.as_str())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::InvalidConfiguration("Missing url".to_string()))?;

        let name = config
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("webhook");

        let mut channel = WebhookChannel::new(name, url);

        if let Some(headers) = config.get("headers").and_then(|h| h.as_object()) {
            for (key, value) in headers {
                if let Some(value) = value.as_str() {
                    channel = channel.with_header(key.clone(), value);
                }
            }
        }

        if !config.get("enabled").and_then(|v| v.as_bool()).unwrap_or(true) {
            channel = channel.disabled();
        }

        Ok(Arc::new(channel))
    }
}
