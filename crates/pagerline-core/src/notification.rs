//! Notification attempt records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::alert::AlertId;
use crate::directory::UserId;

/// Unique notification identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Notification medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Sms,
    Voice,
    Email,
}

impl ChannelKind {
    /// Channels tried at each escalation level, in order.
    pub const ESCALATION_SEQUENCE: [ChannelKind; 2] = [ChannelKind::Sms, ChannelKind::Voice];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Sms => "sms",
            Self::Voice => "voice",
            Self::Email => "email",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sms" => Some(Self::Sms),
            "voice" | "call" => Some(Self::Voice),
            "email" => Some(Self::Email),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification delivery state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    #[default]
    Sent,
    Acknowledged,
}

impl NotificationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Sent => "sent",
            Self::Acknowledged => "acknowledged",
        }
    }
}

/// One delivery attempt to one user over one channel.
///
/// `responded_at`, once set, is never cleared. The most recent row (by
/// `sent_at`) for an (alert, user) pair decides whether the user has
/// acknowledged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertNotification {
    pub id: NotificationId,
    pub alert_id: AlertId,
    pub user_id: UserId,
    pub channel: ChannelKind,
    pub status: NotificationStatus,
    pub sent_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
}

impl AlertNotification {
    /// Create a row for an attempt about to be sent.
    pub fn new(alert_id: AlertId, user_id: impl Into<UserId>, channel: ChannelKind) -> Self {
        Self {
            id: NotificationId::new(),
            alert_id,
            user_id: user_id.into(),
            channel,
            status: NotificationStatus::Sent,
            sent_at: Utc::now(),
            responded_at: None,
        }
    }

    /// Override the send timestamp.
    pub fn with_sent_at(mut self, sent_at: DateTime<Utc>) -> Self {
        self.sent_at = sent_at;
        self
    }

    /// Record the user's response. Returns `false` if one was already recorded.
    pub fn acknowledge(&mut self, now: DateTime<Utc>) -> bool {
        if self.responded_at.is_some() {
            return false;
        }
        self.responded_at = Some(now);
        self.status = NotificationStatus::Acknowledged;
        true
    }

    pub fn is_acknowledged(&self) -> bool {
        self.responded_at.is_some()
    }
}
