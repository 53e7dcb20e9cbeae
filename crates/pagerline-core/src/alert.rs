//! Alert types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a monitored service.
pub type ServiceId = String;

/// Unique alert identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlertId(pub Uuid);

impl AlertId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Alert status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    /// Incident is open
    #[default]
    Active,
    /// Incident was closed by an operator
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Resolved => "resolved",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a human has confirmed the incident was real.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "verified" => Some(Self::Verified),
            _ => None,
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One open incident for a service.
///
/// `resolved_at` is set if and only if `status` is [`AlertStatus::Resolved`].
/// Alerts are never deleted; they are kept as history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub service_id: ServiceId,
    pub status: AlertStatus,
    pub verification_status: VerificationStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alert {
    /// Open a new alert for a service.
    pub fn new(service_id: impl Into<ServiceId>) -> Self {
        let now = Utc::now();
        Self {
            id: AlertId::new(),
            service_id: service_id.into(),
            status: AlertStatus::Active,
            verification_status: VerificationStatus::Pending,
            started_at: now,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Mark the alert resolved. Returns `false` if it already was.
    pub fn resolve(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == AlertStatus::Resolved {
            return false;
        }
        self.status = AlertStatus::Resolved;
        self.resolved_at = Some(now);
        self.updated_at = now;
        true
    }

    /// Mark the incident verified. Returns `false` if it already was.
    pub fn verify(&mut self) -> bool {
        if self.verification_status == VerificationStatus::Verified {
            return false;
        }
        self.verification_status = VerificationStatus::Verified;
        self.updated_at = Utc::now();
        true
    }

    pub fn is_active(&self) -> bool {
        self.status == AlertStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_id() {
        let id = AlertId::new();
        assert_eq!(id.0.get_version(), Some(uuid::Version::Random));
        assert_eq!(AlertId::from_string(&id.to_string()).unwrap(), id);
        assert!(AlertId::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_new_alert_is_active_and_pending() {
        let alert = Alert::new("svc-1");
        assert_eq!(alert.status, AlertStatus::Active);
        assert_eq!(alert.verification_status, VerificationStatus::Pending);
        assert!(alert.resolved_at.is_none());
        assert!(alert.is_active());
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut alert = Alert::new("svc-1");
        let first = Utc::now();
        assert!(alert.resolve(first));
        assert_eq!(alert.resolved_at, Some(first));

        let later = first + chrono::Duration::seconds(30);
        assert!(!alert.resolve(later));
        assert_eq!(alert.resolved_at, Some(first));
        assert_eq!(alert.status, AlertStatus::Resolved);
    }

    #[test]
    fn test_verify_does_not_touch_status() {
        let mut alert = Alert::new("svc-1");
        assert!(alert.verify());
        assert!(!alert.verify());
        assert_eq!(alert.verification_status, VerificationStatus::Verified);
        assert_eq!(alert.status, AlertStatus::Active);
        assert!(alert.resolved_at.is_none());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&AlertStatus::Resolved).unwrap();
        assert_eq!(json, "\"resolved\"");
        assert_eq!(AlertStatus::from_string("ACTIVE"), Some(AlertStatus::Active));
        assert_eq!(VerificationStatus::from_string("verified"), Some(VerificationStatus::Verified));
        assert_eq!(VerificationStatus::from_string("bogus"), None);
    }
}
