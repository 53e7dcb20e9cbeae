//! Server state and component wiring.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use pagerline_alerts::{
    AlertManager, DirectoryChainResolver, EscalationEngine, HealthMonitor, HealthProbe, HttpProbe,
};
use pagerline_core::{ChannelKind, EventBus};
use pagerline_notify::{build_channel, ChannelRegistry, NotificationChannel};
use pagerline_storage::{AlertStore, DirectoryStore, HealthStore};

use crate::config::{AppConfig, NotificationSettings};

/// Maximum request body size (1 MB)
pub const MAX_REQUEST_BODY_SIZE: usize = 1024 * 1024;

/// Server state shared across all handlers.
#[derive(Clone)]
pub struct ServerState {
    /// Effective configuration.
    pub config: Arc<AppConfig>,
    /// Services, users and escalation chains.
    pub directory: DirectoryStore,
    /// Health-check history.
    pub health_history: HealthStore,
    /// Notification channels and their routing.
    pub channels: Arc<ChannelRegistry>,
    /// Event bus for lifecycle, escalation and health events.
    pub event_bus: EventBus,
    /// Alert lifecycle and escalation runs.
    pub alert_manager: Arc<AlertManager>,
    /// Periodic and on-demand health checks.
    pub health_monitor: Arc<HealthMonitor>,
    /// Server start time (unix seconds).
    pub started_at: i64,
}

impl ServerState {
    /// Open the stores under `storage.data_dir`, build the configured
    /// channels and wire everything together.
    pub async fn build(config: AppConfig) -> anyhow::Result<Self> {
        let data_dir = config.storage.data_dir.clone();
        info!(category = "server", data_dir = %data_dir.display(), "Opening stores");

        let alerts = AlertStore::open(&data_dir).context("failed to open alert store")?;
        let directory = DirectoryStore::open(&data_dir).context("failed to open directory store")?;
        let health = HealthStore::open(&data_dir).context("failed to open health store")?;
        let channels = Arc::new(configure_channels(&config.notifications).await?);

        let probe = HttpProbe::new(Duration::from_secs(config.health.timeout_secs))?;
        Ok(Self::from_parts(config, alerts, directory, health, channels, Arc::new(probe)))
    }

    /// Wire a state from already opened stores and channels.
    pub fn from_parts(
        config: AppConfig,
        alerts: AlertStore,
        directory: DirectoryStore,
        health_history: HealthStore,
        channels: Arc<ChannelRegistry>,
        probe: Arc<dyn HealthProbe>,
    ) -> Self {
        let event_bus = EventBus::new();
        let engine = Arc::new(EscalationEngine::new(
            Arc::new(alerts.clone()),
            Arc::new(DirectoryChainResolver::new(directory.clone())),
            channels.clone() as Arc<dyn NotificationChannel>,
            event_bus.clone(),
            config.escalation.engine_config(),
        ));
        let alert_manager = Arc::new(AlertManager::new(alerts, engine, event_bus.clone()));
        let health_monitor = Arc::new(HealthMonitor::new(
            directory.clone(),
            health_history.clone(),
            alert_manager.clone(),
            probe,
            event_bus.clone(),
        ));

        Self {
            config: Arc::new(config),
            directory,
            health_history,
            channels,
            event_bus,
            alert_manager,
            health_monitor,
            started_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Build every configured channel and route each [`ChannelKind`] to the
/// first enabled channel that can carry it: Twilio, then the webhook,
/// then the console.
pub async fn configure_channels(settings: &NotificationSettings) -> anyhow::Result<ChannelRegistry> {
    const ALL: &[ChannelKind] = &[ChannelKind::Sms, ChannelKind::Voice, ChannelKind::Email];
    const PHONE: &[ChannelKind] = &[ChannelKind::Sms, ChannelKind::Voice];

    let mut candidates: Vec<(Arc<dyn NotificationChannel>, &[ChannelKind])> = Vec::new();
    if let Some(twilio) = &settings.twilio {
        let channel = build_channel("twilio", &serde_json::to_value(twilio)?)
            .context("invalid notifications.twilio")?;
        candidates.push((channel, PHONE));
    }
    if let Some(webhook) = &settings.webhook {
        let channel = build_channel("webhook", &serde_json::to_value(webhook)?)
            .context("invalid notifications.webhook")?;
        candidates.push((channel, ALL));
    }
    let console = build_channel("console", &serde_json::to_value(&settings.console)?)?;
    candidates.push((console, ALL));

    let registry = ChannelRegistry::new();
    for (channel, _) in &candidates {
        registry.register(channel.clone()).await;
    }
    for kind in ALL {
        let target = candidates
            .iter()
            .find(|(channel, kinds)| channel.is_enabled() && kinds.contains(kind));
        match target {
            Some((channel, _)) => {
                registry.route(*kind, channel.name()).await?;
                info!(category = "notify", kind = %kind, channel = channel.name(), "Routed notification kind");
            }
            None => warn!(category = "notify", kind = %kind, "No enabled channel for notification kind"),
        }
    }
    Ok(registry)
}
