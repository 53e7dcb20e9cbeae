//! On-call user handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::json;

use pagerline_core::User;

use super::{
    common::{created, ok, require_field, CreatedResult, HandlerResult},
    ServerState,
};
use crate::models::{ErrorResponse, UserRequest};

pub async fn create_user_handler(
    State(state): State<ServerState>,
    Json(req): Json<UserRequest>,
) -> CreatedResult<User> {
    let id = require_field("id", &req.id)?.to_string();
    require_field("phone", &req.phone)?;
    let user = req.into_user(id);
    state.directory.insert_user(&user)?;
    created(user)
}

pub async fn list_users_handler(
    State(state): State<ServerState>,
) -> HandlerResult<serde_json::Value> {
    let users = state.directory.list_users()?;
    ok(json!({
        "count": users.len(),
        "users": users,
    }))
}

pub async fn get_user_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> HandlerResult<User> {
    let user = state
        .directory
        .get_user(&id)?
        .ok_or_else(|| ErrorResponse::not_found(format!("User not found: {}", id)))?;
    ok(user)
}

pub async fn update_user_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<UserRequest>,
) -> HandlerResult<User> {
    require_field("phone", &req.phone)?;
    let updated = state.directory.update_user(&req.into_user(id))?;
    ok(updated)
}

/// Delete a user. Chain levels naming them are skipped from then on.
pub async fn delete_user_handler(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> HandlerResult<serde_json::Value> {
    if !state.directory.delete_user(&id)? {
        return Err(ErrorResponse::not_found(format!("User not found: {}", id)));
    }
    ok(json!({ "deleted": id }))
}
