//! Notification channel listing.

use axum::extract::State;
use serde_json::json;

use super::{
    common::{ok, HandlerResult},
    ServerState,
};

/// List registered channels with the kinds routed to each.
pub async fn list_channels_handler(
    State(state): State<ServerState>,
) -> HandlerResult<serde_json::Value> {
    let channels = state.channels.list_info().await;
    ok(json!({
        "count": channels.len(),
        "channels": channels,
    }))
}
