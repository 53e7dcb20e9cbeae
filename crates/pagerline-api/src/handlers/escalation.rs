//! Escalation chain handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::json;
use tracing::info;

use pagerline_core::EscalationChainEntry;

use super::{
    common::{created, ok, require_field, CreatedResult, ExtractResult, HandlerResult},
    ServerState,
};
use crate::models::{ChainEntryRequest, ChainEntryView, ErrorResponse};

fn ensure_service(state: &ServerState, service_id: &str) -> ExtractResult<()> {
    match state.directory.get_service(service_id)? {
        Some(_) => Ok(()),
        None => Err(ErrorResponse::not_found(format!("Service not found: {}", service_id))),
    }
}

/// Add or replace the user paged at one level of a service's chain.
pub async fn set_chain_entry_handler(
    State(state): State<ServerState>,
    Json(req): Json<ChainEntryRequest>,
) -> CreatedResult<EscalationChainEntry> {
    require_field("service_id", &req.service_id)?;
    require_field("user_id", &req.user_id)?;
    if req.level == 0 {
        return Err(ErrorResponse::bad_request("level must be >= 1"));
    }
    ensure_service(&state, &req.service_id)?;
    if state.directory.get_user(&req.user_id)?.is_none() {
        return Err(ErrorResponse::not_found(format!("User not found: {}", req.user_id)));
    }

    let entry = EscalationChainEntry::from(req);
    state.directory.set_chain_entry(&entry)?;
    info!(
        category = "api",
        service_id = %entry.service_id,
        level = entry.level,
        user_id = %entry.user_id,
        "Escalation level set"
    );
    created(entry)
}

/// The chain for a service, ascending by level.
pub async fn get_chain_handler(
    State(state): State<ServerState>,
    Path(service_id): Path<String>,
) -> HandlerResult<serde_json::Value> {
    ensure_service(&state, &service_id)?;
    let mut levels = Vec::new();
    for entry in state.directory.escalation_chain(&service_id)? {
        let user = state.directory.get_user(&entry.user_id)?;
        levels.push(ChainEntryView { entry, user });
    }
    ok(json!({
        "service_id": service_id,
        "levels": levels,
    }))
}

pub async fn delete_chain_entry_handler(
    State(state): State<ServerState>,
    Path((service_id, level)): Path<(String, u32)>,
) -> HandlerResult<serde_json::Value> {
    if !state.directory.remove_chain_entry(&service_id, level)? {
        return Err(ErrorResponse::not_found(format!(
            "Escalation level {} not found for service {}",
            level, service_id
        )));
    }
    ok(json!({ "service_id": service_id, "level": level }))
}
