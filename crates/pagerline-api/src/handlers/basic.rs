//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use super::ServerState;

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: &'static str,
    pub uptime: u64,
    /// Escalation runs currently in flight
    pub active_escalations: usize,
    pub channels: usize,
}

pub async fn health_handler(State(state): State<ServerState>) -> Json<HealthStatus> {
    let uptime = chrono::Utc::now().timestamp() - state.started_at;

    Json(HealthStatus {
        status: "ok".to_string(),
        service: "pagerline".to_string(),
        version: env!("CARGO_PKG_VERSION"),
        uptime: uptime.max(0) as u64,
        active_escalations: state.alert_manager.runs().active_count(),
        channels: state.channels.len().await,
    })
}
