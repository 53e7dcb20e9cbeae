//! Tests for service, user and escalation chain handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use pagerline_api::handlers::escalation::*;
use pagerline_api::handlers::services::*;
use pagerline_api::handlers::users::*;
use pagerline_api::models::{ChainEntryRequest, HistoryQuery, ServiceRequest, UserRequest};
use pagerline_core::HealthState;

use crate::common::{create_test_server_state, created_data, data, seed_chain, spawn_target, status_of};

fn service_request(id: &str, url: &str) -> ServiceRequest {
    ServiceRequest {
        id: id.to_string(),
        name: format!("{} service", id),
        url: url.to_string(),
        ..ServiceRequest::default()
    }
}

#[tokio::test]
async fn test_service_crud() {
    let (state, _) = create_test_server_state().await;

    let service = created_data(
        create_service_handler(State(state.clone()), Json(service_request("api", "https://api.example.com/health")))
            .await,
    );
    assert_eq!(service.id, "api");
    assert_eq!(service.kind, "http");

    let duplicate =
        create_service_handler(State(state.clone()), Json(service_request("api", "https://other.example.com"))).await;
    assert_eq!(status_of(duplicate), StatusCode::CONFLICT);

    let fetched = data(get_service_handler(State(state.clone()), Path("api".to_string())).await);
    assert_eq!(fetched, service);

    let mut update = service_request("ignored", "https://api.example.com/v2/health");
    update.name = "API v2".to_string();
    let updated = data(update_service_handler(State(state.clone()), Path("api".to_string()), Json(update)).await);
    assert_eq!(updated.id, "api");
    assert_eq!(updated.name, "API v2");
    assert_eq!(updated.created_at, service.created_at);

    let listed = data(list_services_handler(State(state.clone())).await);
    assert_eq!(listed["count"], 1);

    data(delete_service_handler(State(state.clone()), Path("api".to_string())).await);
    let missing = get_service_handler(State(state.clone()), Path("api".to_string())).await;
    assert_eq!(status_of(missing), StatusCode::NOT_FOUND);
    let again = delete_service_handler(State(state), Path("api".to_string())).await;
    assert_eq!(status_of(again), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_service_validation() {
    let (state, _) = create_test_server_state().await;

    let generated = created_data(
        create_service_handler(State(state.clone()), Json(service_request("", "https://db.example.com"))).await,
    );
    assert!(!generated.id.is_empty());

    let bad_url = create_service_handler(State(state.clone()), Json(service_request("x", "ftp://x"))).await;
    assert_eq!(status_of(bad_url), StatusCode::BAD_REQUEST);

    let mut no_name = service_request("y", "https://y.example.com");
    no_name.name = String::new();
    let missing = create_service_handler(State(state.clone()), Json(no_name)).await;
    assert_eq!(status_of(missing), StatusCode::BAD_REQUEST);

    let unknown = update_service_handler(
        State(state),
        Path("nope".to_string()),
        Json(service_request("nope", "https://nope.example.com")),
    )
    .await;
    assert_eq!(status_of(unknown), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_crud() {
    let (state, _) = create_test_server_state().await;
    let req = UserRequest {
        id: "alice".to_string(),
        name: "Alice".to_string(),
        phone: "+15550001".to_string(),
        ..UserRequest::default()
    };
    let user = created_data(create_user_handler(State(state.clone()), Json(req.clone())).await);
    assert_eq!(user.role, "responder");

    let duplicate = create_user_handler(State(state.clone()), Json(req)).await;
    assert_eq!(status_of(duplicate), StatusCode::CONFLICT);

    let no_phone = create_user_handler(
        State(state.clone()),
        Json(UserRequest {
            id: "bob".to_string(),
            ..UserRequest::default()
        }),
    )
    .await;
    assert_eq!(status_of(no_phone), StatusCode::BAD_REQUEST);

    let updated = data(
        update_user_handler(
            State(state.clone()),
            Path("alice".to_string()),
            Json(UserRequest {
                name: "Alice A.".to_string(),
                phone: "+15550009".to_string(),
                role: Some("lead".to_string()),
                ..UserRequest::default()
            }),
        )
        .await,
    );
    assert_eq!(updated.phone, "+15550009");
    assert_eq!(updated.role, "lead");

    assert_eq!(data(list_users_handler(State(state.clone())).await)["count"], 1);
    data(delete_user_handler(State(state.clone()), Path("alice".to_string())).await);
    let missing = get_user_handler(State(state), Path("alice".to_string())).await;
    assert_eq!(status_of(missing), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_escalation_chain() {
    let (state, _) = create_test_server_state().await;
    seed_chain(&state, "api", &["a"]);
    seed_chain(&state, "db", &["b"]);

    let entry = created_data(
        set_chain_entry_handler(
            State(state.clone()),
            Json(ChainEntryRequest {
                service_id: "api".to_string(),
                level: 2,
                user_id: "b".to_string(),
                wait_time_minutes: Some(10),
            }),
        )
        .await,
    );
    assert_eq!(entry.wait_time_minutes, 10);

    let chain = data(get_chain_handler(State(state.clone()), Path("api".to_string())).await);
    let levels = chain["levels"].as_array().unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0]["level"], 1);
    assert_eq!(levels[0]["user"]["id"], "a");
    assert_eq!(levels[1]["user_id"], "b");

    let unknown_user = set_chain_entry_handler(
        State(state.clone()),
        Json(ChainEntryRequest {
            service_id: "api".to_string(),
            level: 3,
            user_id: "ghost".to_string(),
            wait_time_minutes: None,
        }),
    )
    .await;
    assert_eq!(status_of(unknown_user), StatusCode::NOT_FOUND);

    let level_zero = set_chain_entry_handler(
        State(state.clone()),
        Json(ChainEntryRequest {
            service_id: "api".to_string(),
            level: 0,
            user_id: "a".to_string(),
            wait_time_minutes: None,
        }),
    )
    .await;
    assert_eq!(status_of(level_zero), StatusCode::BAD_REQUEST);

    let missing_fields = set_chain_entry_handler(State(state.clone()), Json(ChainEntryRequest::default())).await;
    assert_eq!(status_of(missing_fields), StatusCode::BAD_REQUEST);

    data(delete_chain_entry_handler(State(state.clone()), Path(("api".to_string(), 2))).await);
    let gone = delete_chain_entry_handler(State(state.clone()), Path(("api".to_string(), 2))).await;
    assert_eq!(status_of(gone), StatusCode::NOT_FOUND);

    let no_service = get_chain_handler(State(state), Path("nope".to_string())).await;
    assert_eq!(status_of(no_service), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_check_service_records_history() {
    let (state, _) = create_test_server_state().await;
    let base = spawn_target().await;
    created_data(
        create_service_handler(State(state.clone()), Json(service_request("web", &format!("{}/ok", base)))).await,
    );

    let check = data(check_service_handler(State(state.clone()), Path("web".to_string())).await);
    assert_eq!(check.status, HealthState::Up);
    assert!(state.alert_manager.list_alerts(None).unwrap().is_empty());

    let history = data(
        health_history_handler(State(state.clone()), Path("web".to_string()), Query(HistoryQuery::default())).await,
    );
    assert_eq!(history["count"], 1);
    assert_eq!(history["checks"][0]["status"], "up");

    let unknown = check_service_handler(State(state), Path("nope".to_string())).await;
    assert_eq!(status_of(unknown), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failing_check_opens_one_alert() {
    let (state, _) = create_test_server_state().await;
    let base = spawn_target().await;
    created_data(
        create_service_handler(State(state.clone()), Json(service_request("web", &format!("{}/fail", base)))).await,
    );

    for _ in 0..2 {
        let check = data(check_service_handler(State(state.clone()), Path("web".to_string())).await);
        assert_eq!(check.status, HealthState::Down);
        assert_eq!(check.error.as_deref(), Some("HTTP 503"));
    }

    let alerts = state.alert_manager.list_alerts(None).unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].service_id, "web");
}
