//! Tests for the health and channel endpoints.

use axum::extract::State;

use pagerline_api::handlers::basic::health_handler;
use pagerline_api::handlers::channels::list_channels_handler;

use crate::common::{create_test_server_state, data};

#[tokio::test]
async fn test_health_handler() {
    let (state, _) = create_test_server_state().await;
    let health = health_handler(State(state)).await.0;
    assert_eq!(health.status, "ok");
    assert_eq!(health.service, "pagerline");
    assert!(!health.version.is_empty());
    assert_eq!(health.active_escalations, 0);
    assert_eq!(health.channels, 1);
}

#[tokio::test]
async fn test_list_channels_handler() {
    let (state, _) = create_test_server_state().await;
    let value = data(list_channels_handler(State(state)).await);
    assert_eq!(value["count"], 1);
    let channel = &value["channels"][0];
    assert_eq!(channel["name"], "memory");
    assert_eq!(channel["enabled"], true);
    assert_eq!(channel["kinds"].as_array().unwrap().len(), 3);
}
