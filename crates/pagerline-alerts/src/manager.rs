//! Alert lifecycle.
//!
//! Creating an alert persists it and starts its escalation run in the
//! background. Resolving cancels the run; verifying only records that the
//! incident was real.

use std::sync::Arc;

use chrono::Utc;

use pagerline_core::{
    Alert, AlertEvent, AlertId, AlertNotification, AlertStatus, EscalationPosition, EventBus,
};
use pagerline_storage::AlertStore;

use crate::engine::EscalationEngine;
use crate::runs::RunRegistry;
use crate::{Error, Result};

pub struct AlertManager {
    store: AlertStore,
    engine: Arc<EscalationEngine>,
    runs: RunRegistry,
    bus: EventBus,
}

impl AlertManager {
    pub fn new(store: AlertStore, engine: Arc<EscalationEngine>, bus: EventBus) -> Self {
        Self {
            store,
            engine,
            runs: RunRegistry::new(),
            bus,
        }
    }

    pub fn runs(&self) -> &RunRegistry {
        &self.runs
    }

    pub fn store(&self) -> &AlertStore {
        &self.store
    }

    // ========== Lifecycle ==========

    /// Open an alert for `service_id` and start escalating it.
    ///
    /// Returns as soon as the alert is stored; the run continues on its
    /// own task.
    pub fn create_alert(&self, service_id: &str) -> Result<Alert> {
        if service_id.trim().is_empty() {
            return Err(Error::Validation("service_id must not be empty".to_string()));
        }

        let alert = Alert::new(service_id);
        self.store.insert_alert(&alert)?;
        tracing::info!(alert_id = %alert.id, service_id, "Alert created");
        self.bus.publish(AlertEvent::AlertCreated {
            alert_id: alert.id,
            service_id: alert.service_id.clone(),
            timestamp: alert.created_at.timestamp(),
        });

        self.start_run(alert.clone(), None);
        Ok(alert)
    }

    /// Mark an alert resolved and stop its run. Resolving twice keeps the
    /// first resolution time.
    pub fn resolve(&self, alert_id: &AlertId) -> Result<Alert> {
        let now = Utc::now();
        let alert = self
            .store
            .resolve_alert(alert_id, now)?
            .ok_or_else(|| not_found(alert_id))?;

        self.runs.cancel(alert_id);
        if alert.resolved_at == Some(now) {
            tracing::info!(%alert_id, "Alert resolved");
            self.bus.publish(AlertEvent::AlertResolved {
                alert_id: *alert_id,
                timestamp: now.timestamp(),
            });
        }
        Ok(alert)
    }

    /// Confirm the incident was real. Does not touch escalation.
    pub fn verify(&self, alert_id: &AlertId) -> Result<Alert> {
        let before = self.get_alert(alert_id)?;
        let alert = self
            .store
            .verify_alert(alert_id)?
            .ok_or_else(|| not_found(alert_id))?;

        if before.verification_status != alert.verification_status {
            tracing::info!(%alert_id, "Alert verified");
            self.bus.publish(AlertEvent::AlertVerified {
                alert_id: *alert_id,
                timestamp: Utc::now().timestamp(),
            });
        }
        Ok(alert)
    }

    /// Record `user_id`'s response to their most recent notification and
    /// wake the run waiting on it.
    pub fn acknowledge(&self, alert_id: &AlertId, user_id: &str) -> Result<AlertNotification> {
        if user_id.trim().is_empty() {
            return Err(Error::Validation("user_id must not be empty".to_string()));
        }
        self.get_alert(alert_id)?;

        let notification = self
            .store
            .acknowledge_latest(alert_id, user_id, Utc::now())?
            .ok_or_else(|| {
                Error::NotFound(format!("User {} was not notified for alert {}", user_id, alert_id))
            })?;

        tracing::info!(%alert_id, user_id, channel = %notification.channel, "Acknowledgment recorded");
        self.bus.publish(AlertEvent::Acknowledged {
            alert_id: *alert_id,
            user_id: user_id.to_string(),
            timestamp: Utc::now().timestamp(),
        });
        Ok(notification)
    }

    /// Resume every active alert whose run was interrupted.
    ///
    /// An alert is resumed when no run is live for it and its saved
    /// position is missing or still running. Returns the number resumed.
    pub fn recover(&self) -> Result<usize> {
        let mut resumed = 0;
        for alert in self.store.list_active_alerts()? {
            if self.runs.is_running(&alert.id) {
                continue;
            }
            let position = self.store.get_position(&alert.id)?;
            if position.as_ref().is_some_and(|p| p.is_terminal()) {
                continue;
            }

            tracing::info!(
                alert_id = %alert.id,
                level = ?position.as_ref().map(|p| p.level),
                "Resuming interrupted escalation"
            );
            if self.start_run(alert, position) {
                resumed += 1;
            }
        }
        Ok(resumed)
    }

    fn start_run(&self, alert: Alert, position: Option<EscalationPosition>) -> bool {
        let engine = self.engine.clone();
        self.runs.spawn(alert.id, move |cancel| async move {
            match position {
                Some(position) => engine.resume(&alert, position, cancel).await,
                None => engine.run(&alert, cancel).await,
            }
        })
    }

    // ========== Queries ==========

    pub fn get_alert(&self, alert_id: &AlertId) -> Result<Alert> {
        self.store.get_alert(alert_id)?.ok_or_else(|| not_found(alert_id))
    }

    /// All alerts, newest first, optionally filtered by status.
    pub fn list_alerts(&self, status: Option<AlertStatus>) -> Result<Vec<Alert>> {
        let alerts = self.store.list_alerts()?;
        Ok(match status {
            Some(status) => alerts.into_iter().filter(|a| a.status == status).collect(),
            None => alerts,
        })
    }

    pub fn list_active_alerts(&self) -> Result<Vec<Alert>> {
        Ok(self.store.list_active_alerts()?)
    }

    pub fn active_alert_for_service(&self, service_id: &str) -> Result<Option<Alert>> {
        Ok(self.store.active_alert_for_service(service_id)?)
    }

    /// Every notification attempt for an alert, oldest first.
    pub fn notification_history(&self, alert_id: &AlertId) -> Result<Vec<AlertNotification>> {
        self.get_alert(alert_id)?;
        Ok(self.store.notifications_for_alert(alert_id)?)
    }

    pub fn escalation_position(&self, alert_id: &AlertId) -> Result<Option<EscalationPosition>> {
        self.get_alert(alert_id)?;
        Ok(self.store.get_position(alert_id)?)
    }
}

fn not_found(alert_id: &AlertId) -> Error {
    Error::NotFound(format!("Alert not found: {}", alert_id))
}
