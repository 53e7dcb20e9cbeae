//! Request and response models for the web API.

use serde::{Deserialize, Serialize};

use pagerline_core::{EscalationChainEntry, Service, User};

pub mod common;
pub mod error;

pub use common::{ApiError, ApiResponse, ResponseMeta};
pub use error::{ApiResult, ErrorResponse};

// ============================================================================
// Directory
// ============================================================================

/// Create or replace a service. An empty `id` gets a generated one on create.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

impl ServiceRequest {
    pub fn into_service(self, id: String) -> Service {
        let mut service = Service::new(id, self.name, self.url);
        if let Some(kind) = self.kind.filter(|k| !k.trim().is_empty()) {
            service.kind = kind;
        }
        service.config = self.config;
        service
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl UserRequest {
    pub fn into_user(self, id: String) -> User {
        let mut user = User::new(id, self.name, self.phone).with_email(self.email);
        if let Some(role) = self.role.filter(|r| !r.trim().is_empty()) {
            user.role = role;
        }
        user
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainEntryRequest {
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub wait_time_minutes: Option<u32>,
}

impl From<ChainEntryRequest> for EscalationChainEntry {
    fn from(req: ChainEntryRequest) -> Self {
        let mut entry = EscalationChainEntry::new(req.service_id, req.level, req.user_id);
        if let Some(minutes) = req.wait_time_minutes {
            entry.wait_time_minutes = minutes;
        }
        entry
    }
}

/// One chain level with the user it pages, when that user still exists.
#[derive(Debug, Clone, Serialize)]
pub struct ChainEntryView {
    #[serde(flatten)]
    pub entry: EscalationChainEntry,
    pub user: Option<User>,
}

// ============================================================================
// Alerts
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAlertRequest {
    #[serde(default)]
    pub service_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AcknowledgeRequest {
    #[serde(default)]
    pub user_id: String,
}

/// Query for `GET /api/alerts`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertListQuery {
    pub status: Option<String>,
}

/// Query for health history.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    50
}
