//! Memory notification channel (for testing).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use pagerline_core::ChannelKind;

use super::NotificationChannel;
use crate::{Error, Result};

/// A recorded delivery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delivery {
    pub kind: ChannelKind,
    pub to: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Records deliveries in memory. Clones share the same record.
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    name: String,
    enabled: bool,
    failing: Arc<AtomicBool>,
    attempts: Arc<AtomicUsize>,
    deliveries: Arc<Mutex<Vec<Delivery>>>,
}

impl MemoryChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            failing: Arc::new(AtomicBool::new(false)),
            attempts: Arc::new(AtomicUsize::new(0)),
            deliveries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn disabled(name: impl Into<String>) -> Self {
        Self {
            enabled: false,
            ..Self::new(name)
        }
    }

    /// Make every following send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Sends attempted, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().await.clone()
    }

    /// Successful deliveries.
    pub async fn count(&self) -> usize {
        self.deliveries.lock().await.len()
    }

    pub async fn clear(&self) {
        self.deliveries.lock().await.clear();
    }
}

#[async_trait]
impl NotificationChannel for MemoryChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn channel_type(&self) -> &str {
        "memory"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn send(&self, kind: ChannelKind, to: &str, message: &str) -> Result<()> {
        if !self.enabled {
            return Err(Error::ChannelDisabled(self.name.clone()));
        }
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::SendFailed(format!("{}: simulated failure", self.name)));
        }
        self.deliveries.lock().await.push(Delivery {
            kind,
            to: to.to_string(),
            message: message.to_string(),
            at: Utc::now(),
        });
        Ok(())
    }

    fn get_config(&self) -> Option<serde_json::Value> {
        Some(serde_json::json!({ "storage": "memory" }))
    }
}

pub struct MemoryChannelFactory;

impl super::ChannelFactory for MemoryChannelFactory {
    fn channel_type(&self) -> &str {
        "memory"
    }

    fn create(&self, config: &serde_json::Value) -> Result<Arc<dyn NotificationChannel>> {
        let name = config
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or("memory");

        let enabled = config
            .get("enabled")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);

        let channel = if enabled {
            MemoryChannel::new(name)
        } else {
            MemoryChannel::disabled(name)
        };
        Ok(Arc::new(channel))
    }
}
