//! Notification channels.

pub mod console;
pub mod memory;

#[cfg(feature = "webhook")]
pub mod webhook;

#[cfg(feature = "twilio")]
pub mod twilio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use pagerline_core::ChannelKind;

use crate::{Error, Result};

pub use console::{ConsoleChannel, ConsoleChannelFactory};
pub use memory::{Delivery, MemoryChannel, MemoryChannelFactory};

#[cfg(feature = "webhook")]
pub use webhook::{WebhookChannel, WebhookChannelFactory};

#[cfg(feature = "twilio")]
pub use twilio::{TwilioChannel, TwilioChannelFactory, TwilioConfig};

/// A way of reaching a person.
///
/// `send` makes a single delivery attempt and never retries.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    fn name(&self) -> &str;

    /// Provider type, e.g. "twilio" or "webhook".
    fn channel_type(&self) -> &str;

    fn is_enabled(&self) -> bool;

    /// Deliver `message` to `to` over the given medium.
    async fn send(&self, kind: ChannelKind, to: &str, message: &str) -> Result<()>;

    fn get_config(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Builds a channel from JSON configuration.
pub trait ChannelFactory: Send + Sync {
    fn channel_type(&self) -> &str;

    fn create(&self, config: &serde_json::Value) -> Result<Arc<dyn NotificationChannel>>;
}

/// Look up the factory for a channel type.
pub fn factory_for(channel_type: &str) -> Option<Box<dyn ChannelFactory>> {
    match channel_type {
        "console" => Some(Box::new(ConsoleChannelFactory)),
        "memory" => Some(Box::new(MemoryChannelFactory)),
        #[cfg(feature = "webhook")]
        "webhook" => Some(Box::new(WebhookChannelFactory)),
        #[cfg(feature = "twilio")]
        "twilio" => Some(Box::new(TwilioChannelFactory)),
        _ => None,
    }
}

/// Build a channel of `channel_type` from `config`.
pub fn build_channel(
    channel_type: &str,
    config: &serde_json::Value,
) -> Result<Arc<dyn NotificationChannel>> {
    factory_for(channel_type)
        .ok_or_else(|| Error::InvalidConfiguration(format!("Unknown channel type: {}", channel_type)))?
        .create(config)
}

/// Named channels plus a routing table from [`ChannelKind`] to channel.
///
/// The registry is itself a [`NotificationChannel`]: `send` forwards to the
/// channel routed for the requested kind.
pub struct ChannelRegistry {
    channels: RwLock<HashMap<String, Arc<dyn NotificationChannel>>>,
    routes: RwLock<HashMap<ChannelKind, String>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            routes: RwLock::new(HashMap::new()),
        }
    }

    /// Register a channel under its own name, replacing any previous one.
    pub async fn register(&self, channel: Arc<dyn NotificationChannel>) {
        let name = channel.name().to_string();
        self.channels.write().await.insert(name, channel);
    }

    /// Register a channel and route `kinds` to it.
    pub async fn register_for(&self, kinds: &[ChannelKind], channel: Arc<dyn NotificationChannel>) {
        let name = channel.name().to_string();
        self.register(channel).await;
        let mut routes = self.routes.write().await;
        for kind in kinds {
            routes.insert(*kind, name.clone());
        }
    }

    /// Route `kind` to an already registered channel.
    pub async fn route(&self, kind: ChannelKind, name: &str) -> Result<()> {
        if !self.channels.read().await.contains_key(name) {
            return Err(Error::NotFound(format!("Channel not found: {}", name)));
        }
        self.routes.write().await.insert(kind, name.to_string());
        Ok(())
    }

    /// Remove a channel and any routes pointing at it.
    pub async fn unregister(&self, name: &str) -> bool {
        let removed = self.channels.write().await.remove(name).is_some();
        self.routes.write().await.retain(|_, target| target != name);
        removed
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn NotificationChannel>> {
        self.channels.read().await.get(name).cloned()
    }

    /// Channel that currently handles `kind`.
    pub async fn channel_for(&self, kind: ChannelKind) -> Option<Arc<dyn NotificationChannel>> {
        let name = self.routes.read().await.get(&kind).cloned()?;
        self.get(&name).await
    }

    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.channels.read().await.is_empty()
    }

    pub async fn list_info(&self) -> Vec<ChannelInfo> {
        let channels = self.channels.read().await;
        let routes = self.routes.read().await;
        let mut info: Vec<ChannelInfo> = channels
            .iter()
            .map(|(name, channel)| {
                let mut kinds: Vec<ChannelKind> = routes
                    .iter()
                    .filter(|(_, target)| *target == name)
                    .map(|(kind, _)| *kind)
                    .collect();
                kinds.sort_by_key(|k| k.as_str().to_string());
                ChannelInfo {
                    name: name.clone(),
                    channel_type: channel.channel_type().to_string(),
                    enabled: channel.is_enabled(),
                    kinds,
                    config: channel.get_config(),
                }
            })
            .collect();
        info.sort_by(|a, b| a.name.cmp(&b.name));
        info
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationChannel for ChannelRegistry {
    fn name(&self) -> &str {
        "registry"
    }

    fn channel_type(&self) -> &str {
        "registry"
    }

    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, kind: ChannelKind, to: &str, message: &str) -> Result<()> {
        let channel = self
            .channel_for(kind)
            .await
            .ok_or_else(|| Error::NotFound(format!("No channel routed for {}", kind)))?;
        if !channel.is_enabled() {
            return Err(Error::ChannelDisabled(channel.name().to_string()));
        }
        channel.send(kind, to, message).await
    }
}

/// Information about a registered channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
    pub channel_type: String,
    pub enabled: bool,
    /// Kinds routed to this channel
    pub kinds: Vec<ChannelKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}
