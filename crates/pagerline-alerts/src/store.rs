//! Persistence seen by the escalation engine.

use pagerline_core::{Alert, AlertId, AlertNotification, EscalationPosition};
use pagerline_storage::AlertStore;

use crate::Result;

/// The reads and writes an escalation run performs.
///
/// Implemented for [`AlertStore`]; tests substitute doubles that fail on
/// demand.
pub trait EscalationStore: Send + Sync {
    fn alert(&self, id: &AlertId) -> Result<Option<Alert>>;

    fn record_notification(&self, notification: &AlertNotification) -> Result<()>;

    /// Most recent attempt by `sent_at` for the pair.
    fn latest_notification(&self, alert_id: &AlertId, user_id: &str) -> Result<Option<AlertNotification>>;

    fn save_position(&self, position: &EscalationPosition) -> Result<()>;
}

impl EscalationStore for AlertStore {
    fn alert(&self, id: &AlertId) -> Result<Option<Alert>> {
        Ok(self.get_alert(id)?)
    }

    fn record_notification(&self, notification: &AlertNotification) -> Result<()> {
        Ok(self.insert_notification(notification)?)
    }

    fn latest_notification(&self, alert_id: &AlertId, user_id: &str) -> Result<Option<AlertNotification>> {
        Ok(AlertStore::latest_notification(self, alert_id, user_id)?)
    }

    fn save_position(&self, position: &EscalationPosition) -> Result<()> {
        Ok(AlertStore::save_position(self, position)?)
    }
}
