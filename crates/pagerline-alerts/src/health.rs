//! Health checking and alert triggering.
//!
//! The monitor probes every registered service, records the result and
//! opens an alert for a service that is down. A service with an alert
//! still active is not alerted again until that alert is resolved.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use pagerline_core::{Alert, AlertEvent, EventBus, HealthCheck, Service};
use pagerline_storage::{DirectoryStore, HealthStore};

use crate::manager::AlertManager;
use crate::{Error, Result};

/// Checks whether a service is up.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, service: &Service) -> HealthCheck;
}

/// HTTP GET probe. Any 2xx response counts as up.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Probe(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn probe(&self, service: &Service) -> HealthCheck {
        let started = Instant::now();
        match self.client.get(&service.url).send().await {
            Ok(response) => {
                let elapsed = started.elapsed().as_millis() as u64;
                let status = response.status();
                if status.is_success() {
                    HealthCheck::up(service.id.clone(), elapsed)
                } else {
                    HealthCheck::down(service.id.clone(), elapsed, format!("HTTP {}", status.as_u16()))
                }
            }
            Err(e) => HealthCheck::down(service.id.clone(), 0, e.to_string()),
        }
    }
}

pub struct HealthMonitor {
    directory: DirectoryStore,
    history: HealthStore,
    manager: Arc<AlertManager>,
    probe: Arc<dyn HealthProbe>,
    bus: EventBus,
    // Serialises the "no active alert, so open one" decision.
    trigger: Mutex<()>,
}

impl HealthMonitor {
    pub fn new(
        directory: DirectoryStore,
        history: HealthStore,
        manager: Arc<AlertManager>,
        probe: Arc<dyn HealthProbe>,
        bus: EventBus,
    ) -> Self {
        Self {
            directory,
            history,
            manager,
            probe,
            bus,
            trigger: Mutex::new(()),
        }
    }

    /// Probe one service, record the result and open an alert if it is down.
    pub async fn check_service(&self, service: &Service) -> Result<HealthCheck> {
        let check = self.probe.probe(service).await;
        if let Err(e) = self.history.record(&check) {
            tracing::warn!(service_id = %service.id, error = %e, "Failed to record health check");
        }

        if check.is_down() {
            tracing::warn!(
                service_id = %service.id,
                error = check.error.as_deref().unwrap_or(""),
                "Service is down"
            );
            self.bus.publish(AlertEvent::ServiceDown {
                service_id: service.id.clone(),
                error: check.error.clone(),
                timestamp: Utc::now().timestamp(),
            });
            self.trigger_alert(service).await?;
        } else {
            tracing::debug!(service_id = %service.id, response_time_ms = check.response_time_ms, "Service is up");
            self.bus.publish(AlertEvent::ServiceUp {
                service_id: service.id.clone(),
                response_time_ms: check.response_time_ms,
                timestamp: Utc::now().timestamp(),
            });
        }
        Ok(check)
    }

    /// Open an alert unless the service already has an active one.
    async fn trigger_alert(&self, service: &Service) -> Result<Option<Alert>> {
        let _guard = self.trigger.lock().await;
        if let Some(existing) = self.manager.active_alert_for_service(&service.id)? {
            tracing::debug!(service_id = %service.id, alert_id = %existing.id, "Alert already active");
            return Ok(None);
        }
        self.manager.create_alert(&service.id).map(Some)
    }

    /// Probe every registered service concurrently.
    pub async fn run_once(&self) -> Result<Vec<HealthCheck>> {
        let services = self.directory.list_services()?;
        let results = join_all(services.iter().map(|s| self.check_service(s))).await;

        let mut checks = Vec::with_capacity(results.len());
        for (service, result) in services.iter().zip(results) {
            match result {
                Ok(check) => checks.push(check),
                Err(e) => {
                    tracing::error!(service_id = %service.id, error = %e, "Health check failed")
                }
            }
        }
        Ok(checks)
    }

    /// Run [`run_once`](Self::run_once) every `interval` until stopped.
    /// The first round starts immediately.
    pub fn start(self: Arc<Self>, interval: Duration) -> MonitorHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            tracing::info!(interval_secs = interval.as_secs(), "Health monitor started");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_once().await {
                            tracing::error!(error = %e, "Health check round failed");
                        }
                    }
                }
            }
            tracing::info!("Health monitor stopped");
        });
        MonitorHandle {
            stop: stop_tx,
            task,
        }
    }
}

/// Stops a running [`HealthMonitor`] loop. Dropping the handle also stops it.
pub struct MonitorHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Health monitor task ended abnormally");
        }
    }
}
