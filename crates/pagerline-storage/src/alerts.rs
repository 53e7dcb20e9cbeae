//! Alert, notification and escalation-position storage.
//!
//! This is the acknowledgment store: the escalation engine writes a
//! notification row before every attempt and the acknowledgment wait
//! reads back the most recent row for an (alert, user) pair.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};

use pagerline_core::{Alert, AlertId, AlertNotification, EscalationPosition};

use crate::backend::{self, all_rows, get_row, key, prefix_bounds, time_segment, to_json};
use crate::{Error, Result};

// key = alert_id, value = Alert (JSON)
const ALERTS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("alerts");

// key = alert_id, value = service_id, present while the alert is active
const ACTIVE_TABLE: TableDefinition<&str, &str> = TableDefinition::new("alerts_active");

// key = notification_id, value = AlertNotification (JSON)
const NOTIFICATIONS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("notifications");

// key = alert/user/sent_at/notification_id, value = notification_id
const NOTIFICATION_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("notifications_by_recipient");

// key = alert_id, value = EscalationPosition (JSON)
const POSITIONS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("escalation_positions");

const TABLES: [TableDefinition<&str, &str>; 5] = [
    ALERTS_TABLE,
    ACTIVE_TABLE,
    NOTIFICATIONS_TABLE,
    NOTIFICATION_INDEX,
    POSITIONS_TABLE,
];

/// Persistent store for alerts and their notification history.
#[derive(Clone)]
pub struct AlertStore {
    db: Arc<Database>,
}

impl AlertStore {
    /// Open the store at `dir/alerts.redb`.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let db = backend::open_file(dir.as_ref(), "alerts.redb", &TABLES)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Create an in-memory store.
    pub fn memory() -> Result<Self> {
        let db = backend::open_memory(&TABLES)?;
        Ok(Self { db: Arc::new(db) })
    }

    // ========== Alerts ==========

    pub fn insert_alert(&self, alert: &Alert) -> Result<()> {
        let id = alert.id.to_string();
        let write_txn = self.db.begin_write()?;
        {
            let mut alerts = write_txn.open_table(ALERTS_TABLE)?;
            if alerts.get(id.as_str())?.is_some() {
                return Err(Error::AlreadyExists(format!("alert {}", id)));
            }
            alerts.insert(id.as_str(), to_json(alert)?.as_str())?;
        }
        Self::index_active(&write_txn, alert)?;
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_alert(&self, id: &AlertId) -> Result<Option<Alert>> {
        let read_txn = self.db.begin_read()?;
        let alerts = read_txn.open_table(ALERTS_TABLE)?;
        get_row(&alerts, &id.to_string())
    }

    /// Overwrite an existing alert.
    pub fn update_alert(&self, alert: &Alert) -> Result<()> {
        let id = alert.id.to_string();
        let write_txn = self.db.begin_write()?;
        {
            let mut alerts = write_txn.open_table(ALERTS_TABLE)?;
            if alerts.get(id.as_str())?.is_none() {
                return Err(Error::NotFound(format!("alert {}", id)));
            }
            alerts.insert(id.as_str(), to_json(alert)?.as_str())?;
        }
        Self::index_active(&write_txn, alert)?;
        write_txn.commit()?;
        Ok(())
    }

    fn index_active(write_txn: &redb::WriteTransaction, alert: &Alert) -> Result<()> {
        let mut active = write_txn.open_table(ACTIVE_TABLE)?;
        let id = alert.id.to_string();
        if alert.is_active() {
            active.insert(id.as_str(), alert.service_id.as_str())?;
        } else {
            active.remove(id.as_str())?;
        }
        Ok(())
    }

    /// All alerts, newest first.
    pub fn list_alerts(&self) -> Result<Vec<Alert>> {
        let read_txn = self.db.begin_read()?;
        let alerts = read_txn.open_table(ALERTS_TABLE)?;
        let mut rows: Vec<Alert> = all_rows(&alerts)?;
        rows.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(rows)
    }

    /// Active alerts, newest first.
    pub fn list_active_alerts(&self) -> Result<Vec<Alert>> {
        let read_txn = self.db.begin_read()?;
        let active = read_txn.open_table(ACTIVE_TABLE)?;
        let alerts = read_txn.open_table(ALERTS_TABLE)?;

        let mut rows = Vec::new();
        for entry in active.iter()? {
            let (id, _) = entry?;
            match get_row::<Alert, _>(&alerts, id.value())? {
                Some(alert) => rows.push(alert),
                None => tracing::warn!(alert_id = id.value(), "Active index points at a missing alert"),
            }
        }
        rows.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(rows)
    }

    /// The newest active alert for a service, if any.
    pub fn active_alert_for_service(&self, service_id: &str) -> Result<Option<Alert>> {
        let read_txn = self.db.begin_read()?;
        let active = read_txn.open_table(ACTIVE_TABLE)?;
        let alerts = read_txn.open_table(ALERTS_TABLE)?;

        let mut found: Option<Alert> = None;
        for entry in active.iter()? {
            let (id, service) = entry?;
            if service.value() != service_id {
                continue;
            }
            if let Some(alert) = get_row::<Alert, _>(&alerts, id.value())? {
                if found.as_ref().map_or(true, |f| alert.started_at > f.started_at) {
                    found = Some(alert);
                }
            }
        }
        Ok(found)
    }

    /// Mark an alert resolved. Repeated calls keep the first `resolved_at`.
    /// Returns `None` if the alert does not exist.
    pub fn resolve_alert(&self, id: &AlertId, now: DateTime<Utc>) -> Result<Option<Alert>> {
        self.modify_alert(id, |alert| alert.resolve(now))
    }

    /// Mark an alert verified. Returns `None` if the alert does not exist.
    pub fn verify_alert(&self, id: &AlertId) -> Result<Option<Alert>> {
        self.modify_alert(id, |alert| alert.verify())
    }

    /// Apply `change` inside one write transaction; only written back when
    /// `change` reports a modification.
    fn modify_alert<F>(&self, id: &AlertId, change: F) -> Result<Option<Alert>>
    where
        F: FnOnce(&mut Alert) -> bool,
    {
        let key = id.to_string();
        let write_txn = self.db.begin_write()?;
        let alert = {
            let mut alerts = write_txn.open_table(ALERTS_TABLE)?;
            let Some(mut alert) = get_row::<Alert, _>(&alerts, &key)? else {
                return Ok(None);
            };
            if !change(&mut alert) {
                return Ok(Some(alert));
            }
            alerts.insert(key.as_str(), to_json(&alert)?.as_str())?;
            alert
        };
        Self::index_active(&write_txn, &alert)?;
        write_txn.commit()?;
        Ok(Some(alert))
    }

    // ========== Notifications ==========

    /// Record a notification attempt.
    pub fn insert_notification(&self, notification: &AlertNotification) -> Result<()> {
        backend::check_key_segment("user", &notification.user_id)?;
        let id = notification.id.to_string();
        let index_key = Self::index_key(notification);

        let write_txn = self.db.begin_write()?;
        {
            let mut rows = write_txn.open_table(NOTIFICATIONS_TABLE)?;
            rows.insert(id.as_str(), to_json(notification)?.as_str())?;
            let mut index = write_txn.open_table(NOTIFICATION_INDEX)?;
            index.insert(index_key.as_str(), id.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn index_key(notification: &AlertNotification) -> String {
        key(&[
            &notification.alert_id.to_string(),
            &notification.user_id,
            &time_segment(&notification.sent_at),
            &notification.id.to_string(),
        ])
    }

    /// Every attempt for an alert, oldest first.
    pub fn notifications_for_alert(&self, alert_id: &AlertId) -> Result<Vec<AlertNotification>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(NOTIFICATION_INDEX)?;
        let rows = read_txn.open_table(NOTIFICATIONS_TABLE)?;

        let (start, end) = prefix_bounds(&[&alert_id.to_string()]);
        let mut out = Vec::new();
        for entry in index.range(start.as_str()..end.as_str())? {
            let (_, id) = entry?;
            if let Some(n) = get_row::<AlertNotification, _>(&rows, id.value())? {
                out.push(n);
            }
        }
        out.sort_by(|a, b| a.sent_at.cmp(&b.sent_at));
        Ok(out)
    }

    /// The most recent attempt (by `sent_at`) for an alert and user.
    pub fn latest_notification(
        &self,
        alert_id: &AlertId,
        user_id: &str,
    ) -> Result<Option<AlertNotification>> {
        let read_txn = self.db.begin_read()?;
        let index = read_txn.open_table(NOTIFICATION_INDEX)?;
        let Some(id) = Self::latest_id(&index, alert_id, user_id)? else {
            return Ok(None);
        };
        let rows = read_txn.open_table(NOTIFICATIONS_TABLE)?;
        get_row(&rows, &id)
    }

    fn latest_id<R>(index: &R, alert_id: &AlertId, user_id: &str) -> Result<Option<String>>
    where
        R: ReadableTable<&'static str, &'static str>,
    {
        let (start, end) = prefix_bounds(&[&alert_id.to_string(), user_id]);
        let mut range = index.range(start.as_str()..end.as_str())?;
        match range.next_back() {
            Some(entry) => {
                let (_, id) = entry?;
                Ok(Some(id.value().to_string()))
            }
            None => Ok(None),
        }
    }

    /// Stamp `responded_at` on the most recent attempt for the pair.
    ///
    /// Returns the row as stored afterwards, or `None` when the user was
    /// never notified for this alert. An existing response time is kept.
    pub fn acknowledge_latest(
        &self,
        alert_id: &AlertId,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AlertNotification>> {
        let write_txn = self.db.begin_write()?;
        let latest = {
            let index = write_txn.open_table(NOTIFICATION_INDEX)?;
            Self::latest_id(&index, alert_id, user_id)?
        };
        let Some(id) = latest else {
            return Ok(None);
        };

        let notification = {
            let mut rows = write_txn.open_table(NOTIFICATIONS_TABLE)?;
            let Some(mut notification) = get_row::<AlertNotification, _>(&rows, &id)? else {
                return Err(Error::Storage(format!("notification {} missing from table", id)));
            };
            if notification.acknowledge(now) {
                rows.insert(id.as_str(), to_json(&notification)?.as_str())?;
            }
            notification
        };
        write_txn.commit()?;
        Ok(Some(notification))
    }

    // ========== Escalation positions ==========

    pub fn save_position(&self, position: &EscalationPosition) -> Result<()> {
        let id = position.alert_id.to_string();
        let write_txn = self.db.begin_write()?;
        {
            let mut positions = write_txn.open_table(POSITIONS_TABLE)?;
            positions.insert(id.as_str(), to_json(position)?.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_position(&self, alert_id: &AlertId) -> Result<Option<EscalationPosition>> {
        let read_txn = self.db.begin_read()?;
        let positions = read_txn.open_table(POSITIONS_TABLE)?;
        get_row(&positions, &alert_id.to_string())
    }
}
