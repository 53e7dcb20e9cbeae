//! Events published on the event bus.
//!
//! Components signal state changes to each other through these events.
//! The acknowledgment wait subscribes to [`AlertEvent::Acknowledged`] so a
//! response is seen without waiting for the next store poll.

use serde::{Deserialize, Serialize};

use crate::alert::{AlertId, ServiceId};
use crate::directory::UserId;
use crate::escalation::RunState;
use crate::notification::ChannelKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AlertEvent {
    // ========== Alert lifecycle ==========
    AlertCreated {
        alert_id: AlertId,
        service_id: ServiceId,
        timestamp: i64,
    },

    AlertResolved {
        alert_id: AlertId,
        timestamp: i64,
    },

    AlertVerified {
        alert_id: AlertId,
        timestamp: i64,
    },

    // ========== Escalation ==========
    NotificationSent {
        alert_id: AlertId,
        user_id: UserId,
        level: u32,
        channel: ChannelKind,
        timestamp: i64,
    },

    /// The channel rejected the attempt; escalation continues regardless
    NotificationFailed {
        alert_id: AlertId,
        user_id: UserId,
        level: u32,
        channel: ChannelKind,
        error: String,
        timestamp: i64,
    },

    /// A user responded to the most recent notification
    Acknowledged {
        alert_id: AlertId,
        user_id: UserId,
        timestamp: i64,
    },

    EscalationFinished {
        alert_id: AlertId,
        state: RunState,
        attempts: u32,
        timestamp: i64,
    },

    // ========== Health ==========
    ServiceDown {
        service_id: ServiceId,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        timestamp: i64,
    },

    ServiceUp {
        service_id: ServiceId,
        response_time_ms: u64,
        timestamp: i64,
    },
}

impl AlertEvent {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::AlertCreated { .. } => "AlertCreated",
            Self::AlertResolved { .. } => "AlertResolved",
            Self::AlertVerified { .. } => "AlertVerified",
            Self::NotificationSent { .. } => "NotificationSent",
            Self::NotificationFailed { .. } => "NotificationFailed",
            Self::Acknowledged { .. } => "Acknowledged",
            Self::EscalationFinished { .. } => "EscalationFinished",
            Self::ServiceDown { .. } => "ServiceDown",
            Self::ServiceUp { .. } => "ServiceUp",
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Self::AlertCreated { timestamp, .. }
            | Self::AlertResolved { timestamp, .. }
            | Self::AlertVerified { timestamp, .. }
            | Self::NotificationSent { timestamp, .. }
            | Self::NotificationFailed { timestamp, .. }
            | Self::Acknowledged { timestamp, .. }
            | Self::EscalationFinished { timestamp, .. }
            | Self::ServiceDown { timestamp, .. }
            | Self::ServiceUp { timestamp, .. } => *timestamp,
        }
    }

    /// Alert the event refers to, if any.
    pub fn alert_id(&self) -> Option<AlertId> {
        match self {
            Self::AlertCreated { alert_id, .. }
            | Self::AlertResolved { alert_id, .. }
            | Self::AlertVerified { alert_id, .. }
            | Self::NotificationSent { alert_id, .. }
            | Self::NotificationFailed { alert_id, .. }
            | Self::Acknowledged { alert_id, .. }
            | Self::EscalationFinished { alert_id, .. } => Some(*alert_id),
            Self::ServiceDown { .. } | Self::ServiceUp { .. } => None,
        }
    }

    pub fn is_lifecycle_event(&self) -> bool {
        matches!(
            self,
            Self::AlertCreated { .. } | Self::AlertResolved { .. } | Self::AlertVerified { .. }
        )
    }

    pub fn is_escalation_event(&self) -> bool {
        matches!(
            self,
            Self::NotificationSent { .. }
                | Self::NotificationFailed { .. }
                | Self::Acknowledged { .. }
                | Self::EscalationFinished { .. }
        )
    }

    pub fn is_health_event(&self) -> bool {
        matches!(self, Self::ServiceDown { .. } | Self::ServiceUp { .. })
    }

    /// Whether this is an acknowledgment by `user_id` for `alert_id`.
    pub fn is_acknowledgment_of(&self, alert: &AlertId, user: &str) -> bool {
        matches!(self, Self::Acknowledged { alert_id, user_id, .. } if alert_id == alert && user_id == user)
    }
}

/// Attached to each published event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    pub event_id: String,
    /// Component that published the event
    pub source: String,
    pub timestamp: i64,
}

impl EventMetadata {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            source: source.into(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_name() {
        let event = AlertEvent::AlertCreated {
            alert_id: AlertId::new(),
            service_id: "svc".to_string(),
            timestamp: 1,
        };
        assert_eq!(event.type_name(), "AlertCreated");
        assert!(event.is_lifecycle_event());
        assert!(!event.is_escalation_event());
        assert_eq!(event.timestamp(), 1);
    }

    #[test]
    fn test_acknowledgment_match() {
        let alert = AlertId::new();
        let event = AlertEvent::Acknowledged {
            alert_id: alert,
            user_id: "bob".to_string(),
            timestamp: 0,
        };
        assert!(event.is_acknowledgment_of(&alert, "bob"));
        assert!(!event.is_acknowledgment_of(&alert, "alice"));
        assert!(!event.is_acknowledgment_of(&AlertId::new(), "bob"));
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = AlertEvent::ServiceDown {
            service_id: "api".to_string(),
            error: Some("HTTP 503".to_string()),
            timestamp: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ServiceDown");
        assert_eq!(event.alert_id(), None);
    }
}
