//! Twilio SMS and voice channel.
//!
//! SMS goes through the Messages resource; voice calls go through the
//! Calls resource with inline TwiML that reads the message aloud.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pagerline_core::ChannelKind;

use super::NotificationChannel;
use crate::{Error, Result};

const DEFAULT_API_BASE: &str = "https://api.twilio.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Caller id for SMS and calls
    pub from_number: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl TwilioConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("account_sid", &self.account_sid),
            ("auth_token", &self.auth_token),
            ("from_number", &self.from_number),
        ] {
            if value.trim().is_empty() {
                return Err(Error::InvalidConfiguration(format!("twilio {} is required", field)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TwilioChannel {
    name: String,
    enabled: bool,
    config: TwilioConfig,
    client: reqwest::Client,
}

impl TwilioChannel {
    pub fn new(name: impl Into<String>, config: TwilioConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::InvalidConfiguration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            name: name.into(),
            enabled: true,
            config,
            client,
        })
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// REST endpoint for a notification kind.
    fn endpoint(&self, kind: ChannelKind) -> Result<String> {
        let resource = match kind {
            ChannelKind::Sms => "Messages.json",
            ChannelKind::Voice => "Calls.json",
            ChannelKind::Email => {
                return Err(Error::Unsupported("twilio cannot send email".to_string()))
            }
        };
        Ok(format!(
            "{}/2010-04-01/Accounts/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid,
            resource
        ))
    }

    fn form(&self, kind: ChannelKind, to: &str, message: &str) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("To", to.to_string()),
            ("From", self.config.from_number.clone()),
        ];
        match kind {
            ChannelKind::Voice => form.push(("Twiml", say_twiml(message))),
            _ => form.push(("Body", message.to_string())),
        }
        form
    }
}

/// TwiML document that speaks `message`.
pub fn say_twiml(message: &str) -> String {
    format!("<Response><Say>{}</Say></Response>", xml_escape(message))
}

fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[async_trait]
impl NotificationChannel for TwilioChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &str {
        "twilio"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, kind: ChannelKind, to: &str, message: &str) -> Result<()> {
        if !self.enabled {
            return Err(Error::ChannelDisabled(self.name.clone()));
        }
        let url = self.endpoint(kind)?;

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&self.form(kind, to, message))
            .send()
            .await
            .map_err(|e| Error::SendFailed(format!("Twilio request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::SendFailed(format!("Twilio returned {}: {}", status, detail)));
        }

        tracing::debug!(channel = %kind, to, "Twilio accepted notification");
        Ok(())
    }

    fn get_config(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({
            "account_sid": self.config.account_sid,
            "from_number": self.config.from_number,
            "api_base": self.config.api_base,
        }))
    }
}

pub struct TwilioChannelFactory;

impl super::ChannelFactory for TwilioChannelFactory {
    fn channel_type(&self) -> &str {
        "twilio"
    }

    fn create(&self, config: &serde_json::Value) -> Result<Arc<dyn NotificationChannel>> {
        let twilio: TwilioConfig = serde_json::from_value(config.clone())
            .map_err(|e| Error::InvalidConfiguration(format!("twilio: {}", e)))?;
        let name = config
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("twilio");

        let mut channel = TwilioChannel::new(name, twilio)?;
        if !config.get("enabled").and_then(|v| v.as_bool()).unwrap_or(true) {
            channel = channel.disabled();
        }
        Ok(Arc::new(channel))
    }
}
