//! Alert lifecycle handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::json;

use pagerline_core::{Alert, AlertNotification, AlertStatus};

use super::{
    common::{created, ok, parse_alert_id, require_field, CreatedResult, HandlerResult},
    ServerState,
};
use crate::models::{AcknowledgeRequest, AlertListQuery, CreateAlertRequest, ErrorResponse};

/// List alerts, optionally filtered by `?status=active|resolved`.
pub async fn list_alerts_handler(
    State(state): State<ServerState>,
    Query(query): Query<AlertListQuery>,
) -> HandlerResult<serde_json::Value> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(s) => Some(
            AlertStatus::from_string(s)
                .ok_or_else(|| ErrorResponse::bad_request(format!("Invalid status: {}", s)))?,
        ),
    };
    let alerts = state.alert_manager.list_alerts(status)?;
    ok(json!({
        "count": alerts.len(),
        "alerts": alerts,
    }))
}

/// Open an alert by hand and start escalating it.
pub async fn create_alert_handler(
    State(state): State<ServerState>,
    Json(req): Json<CreateAlertRequest>,
) -> CreatedResult<Alert> {
    let service_id = require_field("service_id", &req.service_id)?;
    if state.directory.get_service(service_id)?.is_none() {
        return Err(ErrorResponse::not_found(format!("Service not found: {}", service_id)));
    }
    created(state.alert_manager.create_alert(service_id)?)
}

pub async fn get_alert_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> HandlerResult<Alert> {
    let alert_id = parse_alert_id(&id)?;
    ok(state.alert_manager.get_alert(&alert_id)?)
}

/// Every notification attempt for an alert, oldest first.
pub async fn alert_notifications_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> HandlerResult<serde_json::Value> {
    let alert_id = parse_alert_id(&id)?;
    let notifications = state.alert_manager.notification_history(&alert_id)?;
    ok(json!({
        "alert_id": alert_id,
        "count": notifications.len(),
        "notifications": notifications,
    }))
}

/// Persisted escalation position and whether a run is live.
pub async fn alert_escalation_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> HandlerResult<serde_json::Value> {
    let alert_id = parse_alert_id(&id)?;
    let position = state.alert_manager.escalation_position(&alert_id)?;
    ok(json!({
        "alert_id": alert_id,
        "running": state.alert_manager.runs().is_running(&alert_id),
        "position": position,
    }))
}

pub async fn resolve_alert_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> HandlerResult<Alert> {
    let alert_id = parse_alert_id(&id)?;
    ok(state.alert_manager.resolve(&alert_id)?)
}

pub async fn verify_alert_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> HandlerResult<Alert> {
    let alert_id = parse_alert_id(&id)?;
    ok(state.alert_manager.verify(&alert_id)?)
}

/// Record that `user_id` responded. Stops the escalation once the run
/// sees it.
pub async fn acknowledge_alert_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<AcknowledgeRequest>,
) -> HandlerResult<AlertNotification> {
    let alert_id = parse_alert_id(&id)?;
    let user_id = require_field("user_id", &req.user_id)?;
    ok(state.alert_manager.acknowledge(&alert_id, user_id)?)
}
