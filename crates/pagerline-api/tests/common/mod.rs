//! Common test utilities for API tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tokio::net::TcpListener;

use pagerline_alerts::HttpProbe;
use pagerline_api::handlers::common::{CreatedResult, HandlerResult};
use pagerline_api::models::ErrorResponse;
use pagerline_api::{AppConfig, ServerState};
use pagerline_core::{ChannelKind, EscalationChainEntry, Service, User};
use pagerline_notify::{ChannelRegistry, MemoryChannel};
use pagerline_storage::{AlertStore, DirectoryStore, HealthStore};

/// A server state over in-memory stores with every notification kind
/// routed to one recording channel.
pub async fn create_test_server_state() -> (ServerState, MemoryChannel) {
    let channel = MemoryChannel::new("memory");
    let registry = ChannelRegistry::new();
    registry
        .register_for(
            &[ChannelKind::Sms, ChannelKind::Voice, ChannelKind::Email],
            Arc::new(channel.clone()),
        )
        .await;

    let state = ServerState::from_parts(
        AppConfig::default(),
        AlertStore::memory().unwrap(),
        DirectoryStore::memory().unwrap(),
        HealthStore::memory().unwrap(),
        Arc::new(registry),
        Arc::new(HttpProbe::new(Duration::from_secs(5)).unwrap()),
    );
    (state, channel)
}

/// Register `service_id` with one user per level.
pub fn seed_chain(state: &ServerState, service_id: &str, user_ids: &[&str]) {
    state
        .directory
        .insert_service(&Service::new(
            service_id,
            service_id.to_uppercase(),
            format!("https://{}.example.com/health", service_id),
        ))
        .unwrap();
    for (i, user_id) in user_ids.iter().enumerate() {
        state
            .directory
            .insert_user(&User::new(*user_id, user_id.to_uppercase(), format!("+1555010{:04}", i)))
            .unwrap();
        state
            .directory
            .set_chain_entry(&EscalationChainEntry::new(service_id, i as u32 + 1, *user_id))
            .unwrap();
    }
}

/// Serve `/ok` (200) and `/fail` (503) on an ephemeral port.
pub async fn spawn_target() -> String {
    let app = Router::new()
        .route("/ok", get(|| async { "ok" }))
        .route("/fail", get(|| async { StatusCode::SERVICE_UNAVAILABLE }));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn data<T: std::fmt::Debug>(result: HandlerResult<T>) -> T {
    let Json(response) = result.unwrap();
    assert!(response.success);
    response.data.unwrap()
}

pub fn created_data<T: std::fmt::Debug>(result: CreatedResult<T>) -> T {
    let (status, Json(response)) = result.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    response.data.unwrap()
}

pub fn status_of<T: std::fmt::Debug>(result: Result<T, ErrorResponse>) -> StatusCode {
    result.unwrap_err().status
}
