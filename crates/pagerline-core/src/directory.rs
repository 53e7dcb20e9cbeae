//! Services, on-call users and escalation chains.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::ServiceId;
use crate::error::{Error, Result};

/// Identifier of an on-call user.
pub type UserId = String;

/// A monitored external service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    /// Probe type, e.g. "http"
    #[serde(default = "default_service_kind")]
    pub kind: String,
    pub url: String,
    /// Free-form probe settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_service_kind() -> String {
    "http".to_string()
}

impl Service {
    pub fn new(id: impl Into<ServiceId>, name: impl Into<String>, url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            kind: default_service_kind(),
            url: url.into(),
            config: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("service id is required".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(Error::Validation("service name is required".to_string()));
        }
        if !(self.url.starts_with("http://") || self.url.starts_with("https://")) {
            return Err(Error::Validation(format!("unsupported service url: {}", self.url)));
        }
        Ok(())
    }
}

/// A person who can be paged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    /// E.164 number used for SMS and voice
    pub phone: String,
    #[serde(default = "default_role")]
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_role() -> String {
    "responder".to_string()
}

impl User {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, phone: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            phone: phone.into(),
            role: default_role(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Validation("user id is required".to_string()));
        }
        if self.phone.trim().is_empty() {
            return Err(Error::Validation(format!("user {} has no phone number", self.id)));
        }
        Ok(())
    }
}

/// One rung of a service's on-call ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationChainEntry {
    pub service_id: ServiceId,
    /// Positive, unique per service; defines ascending order
    pub level: u32,
    pub user_id: UserId,
    /// Advisory only; the engine's response timeout governs actual waiting
    #[serde(default)]
    pub wait_time_minutes: u32,
}

impl EscalationChainEntry {
    pub fn new(service_id: impl Into<ServiceId>, level: u32, user_id: impl Into<UserId>) -> Self {
        Self {
            service_id: service_id.into(),
            level,
            user_id: user_id.into(),
            wait_time_minutes: 5,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.level == 0 {
            return Err(Error::Validation("escalation level must be >= 1".to_string()));
        }
        if self.service_id.trim().is_empty() || self.user_id.trim().is_empty() {
            return Err(Error::Validation(
                "escalation entry needs a service and a user".to_string(),
            ));
        }
        Ok(())
    }
}

/// A resolved chain rung: the level and the user to page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainLink {
    pub level: u32,
    pub user: User,
}

/// Result of a health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Up,
    Down,
}

impl HealthState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

/// A recorded health probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub service_id: ServiceId,
    pub status: HealthState,
    /// Milliseconds; zero when the request never completed
    pub response_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl HealthCheck {
    pub fn up(service_id: impl Into<ServiceId>, response_time_ms: u64) -> Self {
        Self {
            service_id: service_id.into(),
            status: HealthState::Up,
            response_time_ms,
            error: None,
            checked_at: Utc::now(),
        }
    }

    pub fn down(service_id: impl Into<ServiceId>, response_time_ms: u64, error: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            status: HealthState::Down,
            response_time_ms,
            error: Some(error.into()),
            checked_at: Utc::now(),
        }
    }

    pub fn is_down(&self) -> bool {
        self.status == HealthState::Down
    }
}
