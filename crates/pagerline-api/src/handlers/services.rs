//! Monitored service handlers.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::json;
use tracing::info;

use pagerline_core::{HealthCheck, Service};

use super::{
    common::{created, ok, require_field, CreatedResult, ExtractResult, HandlerResult},
    ServerState,
};
use crate::models::{ErrorResponse, HistoryQuery, ServiceRequest};

/// Upper bound on `limit` for health history.
const MAX_HISTORY: usize = 1000;

fn find_service(state: &ServerState, id: &str) -> ExtractResult<Service> {
    state
        .directory
        .get_service(id)?
        .ok_or_else(|| ErrorResponse::not_found(format!("Service not found: {}", id)))
}

/// Register a service. A missing id is generated.
pub async fn create_service_handler(
    State(state): State<ServerState>,
    Json(req): Json<ServiceRequest>,
) -> CreatedResult<Service> {
    require_field("name", &req.name)?;
    require_field("url", &req.url)?;
    let id = match req.id.trim() {
        "" => uuid::Uuid::new_v4().to_string(),
        id => id.to_string(),
    };

    let service = req.into_service(id);
    state.directory.insert_service(&service)?;
    info!(category = "api", service_id = %service.id, "Service registered");
    created(service)
}

pub async fn list_services_handler(
    State(state): State<ServerState>,
) -> HandlerResult<serde_json::Value> {
    let services = state.directory.list_services()?;
    ok(json!({
        "count": services.len(),
        "services": services,
    }))
}

pub async fn get_service_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> HandlerResult<Service> {
    ok(find_service(&state, &id)?)
}

/// Replace a service's name, url, kind and config.
pub async fn update_service_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ServiceRequest>,
) -> HandlerResult<Service> {
    require_field("name", &req.name)?;
    require_field("url", &req.url)?;
    let updated = state.directory.update_service(&req.into_service(id))?;
    ok(updated)
}

/// Delete a service and its escalation chain.
pub async fn delete_service_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> HandlerResult<serde_json::Value> {
    if !state.directory.delete_service(&id)? {
        return Err(ErrorResponse::not_found(format!("Service not found: {}", id)));
    }
    info!(category = "api", service_id = %id, "Service deleted");
    ok(json!({ "deleted": id }))
}

/// Probe a service now. A failing probe raises an alert exactly as the
/// periodic monitor would.
pub async fn check_service_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> HandlerResult<HealthCheck> {
    let service = find_service(&state, &id)?;
    let check = state.health_monitor.check_service(&service).await?;
    ok(check)
}

/// Recent health checks, newest first.
pub async fn health_history_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> HandlerResult<serde_json::Value> {
    find_service(&state, &id)?;
    let checks = state.health_history.history(&id, query.limit.min(MAX_HISTORY))?;
    ok(json!({
        "service_id": id,
        "count": checks.len(),
        "checks": checks,
    }))
}
