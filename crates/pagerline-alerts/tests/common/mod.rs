//! Shared fixtures for the alerts integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pagerline_alerts::{
    AlertManager, DirectoryChainResolver, EscalationConfig, EscalationEngine, EscalationStore,
    Error, Result,
};
use pagerline_core::{Alert, AlertId, AlertNotification, EscalationChainEntry, EscalationPosition, EventBus, User};
use pagerline_notify::MemoryChannel;
use pagerline_storage::{AlertStore, DirectoryStore};

pub fn config() -> EscalationConfig {
    EscalationConfig {
        response_timeout: Duration::from_secs(300),
        poll_interval: Duration::from_secs(1),
        ..EscalationConfig::default()
    }
}

/// In-memory stores, a recording channel and a manager wired together.
pub struct Harness {
    pub alerts: AlertStore,
    pub directory: DirectoryStore,
    pub channel: MemoryChannel,
    pub bus: EventBus,
    pub manager: Arc<AlertManager>,
}

impl Harness {
    pub fn new() -> Self {
        let alerts = AlertStore::memory().unwrap();
        let directory = DirectoryStore::memory().unwrap();
        let channel = MemoryChannel::new("memory");
        let bus = EventBus::new();
        let engine = Arc::new(Self::engine(&directory, &channel, &bus, Arc::new(alerts.clone())));
        let manager = Arc::new(AlertManager::new(alerts.clone(), engine, bus.clone()));
        Self {
            alerts,
            directory,
            channel,
            bus,
            manager,
        }
    }

    fn engine(
        directory: &DirectoryStore,
        channel: &MemoryChannel,
        bus: &EventBus,
        store: Arc<dyn EscalationStore>,
    ) -> EscalationEngine {
        EscalationEngine::new(
            store,
            Arc::new(DirectoryChainResolver::new(directory.clone())),
            Arc::new(channel.clone()),
            bus.clone(),
            config(),
        )
    }

    /// An engine sharing this harness's directory and channel but reading
    /// and writing through `store`.
    pub fn engine_with_store(&self, store: Arc<dyn EscalationStore>) -> EscalationEngine {
        Self::engine(&self.directory, &self.channel, &self.bus, store)
    }

    /// Chain for `service_id` with one user per level, levels from 1.
    pub fn chain(&self, service_id: &str, user_ids: &[&str]) {
        for (i, user_id) in user_ids.iter().enumerate() {
            let phone = format!("+1555000{:04}", i);
            let user = User::new(*user_id, user_id.to_uppercase(), phone);
            if self.directory.get_user(user_id).unwrap().is_none() {
                self.directory.insert_user(&user).unwrap();
            }
            self.directory
                .set_chain_entry(&EscalationChainEntry::new(service_id, i as u32 + 1, *user_id))
                .unwrap();
        }
    }

    pub fn phone_of(&self, user_id: &str) -> String {
        self.directory.get_user(user_id).unwrap().unwrap().phone
    }
}

/// Store double that fails a set number of notification writes and
/// acknowledgment polls before delegating. Writes can be let through
/// before the failures start.
pub struct FlakyStore {
    pub inner: AlertStore,
    pub passing_writes: AtomicUsize,
    pub failing_writes: AtomicUsize,
    pub failing_polls: AtomicUsize,
    pub polls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: AlertStore) -> Self {
        Self {
            inner,
            passing_writes: AtomicUsize::new(0),
            failing_writes: AtomicUsize::new(0),
            failing_polls: AtomicUsize::new(0),
            polls: AtomicUsize::new(0),
        }
    }

    pub fn pass_writes(self, n: usize) -> Self {
        self.passing_writes.store(n, Ordering::SeqCst);
        self
    }

    pub fn fail_writes(self, n: usize) -> Self {
        self.failing_writes.store(n, Ordering::SeqCst);
        self
    }

    pub fn fail_polls(self, n: usize) -> Self {
        self.failing_polls.store(n, Ordering::SeqCst);
        self
    }

    fn take(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl EscalationStore for FlakyStore {
    fn alert(&self, id: &AlertId) -> Result<Option<Alert>> {
        Ok(self.inner.get_alert(id)?)
    }

    fn record_notification(&self, notification: &AlertNotification) -> Result<()> {
        if !Self::take(&self.passing_writes) && Self::take(&self.failing_writes) {
            return Err(Error::Storage("write rejected".to_string()));
        }
        Ok(self.inner.insert_notification(notification)?)
    }

    fn latest_notification(&self, alert_id: &AlertId, user_id: &str) -> Result<Option<AlertNotification>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        if Self::take(&self.failing_polls) {
            return Err(Error::Storage("store unreachable".to_string()));
        }
        Ok(self.inner.latest_notification(alert_id, user_id)?)
    }

    fn save_position(&self, position: &EscalationPosition) -> Result<()> {
        Ok(self.inner.save_position(position)?)
    }
}
