//! Tests for alert handlers.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use pagerline_api::handlers::alerts::*;
use pagerline_api::models::{AcknowledgeRequest, AlertListQuery, CreateAlertRequest};
use pagerline_core::{AlertStatus, ChannelKind, VerificationStatus};

use crate::common::{create_test_server_state, created_data, data, seed_chain, status_of};

fn create_request(service_id: &str) -> Json<CreateAlertRequest> {
    Json(CreateAlertRequest {
        service_id: service_id.to_string(),
    })
}

fn ack_request(user_id: &str) -> Json<AcknowledgeRequest> {
    Json(AcknowledgeRequest {
        user_id: user_id.to_string(),
    })
}

#[tokio::test(start_paused = true)]
async fn test_create_and_get_alert() {
    let (state, _) = create_test_server_state().await;
    seed_chain(&state, "api", &["a"]);

    let alert = created_data(create_alert_handler(State(state.clone()), create_request("api")).await);
    assert_eq!(alert.status, AlertStatus::Active);
    assert!(state.alert_manager.runs().is_running(&alert.id));

    let fetched = data(get_alert_handler(State(state.clone()), Path(alert.id.to_string())).await);
    assert_eq!(fetched.id, alert.id);

    let escalation = data(alert_escalation_handler(State(state.clone()), Path(alert.id.to_string())).await);
    assert_eq!(escalation["running"], true);

    data(resolve_alert_handler(State(state.clone()), Path(alert.id.to_string())).await);
    state.alert_manager.runs().join(&alert.id).await;
}

#[tokio::test]
async fn test_create_alert_rejects_bad_input() {
    let (state, _) = create_test_server_state().await;

    let missing = create_alert_handler(State(state.clone()), create_request("  ")).await;
    assert_eq!(status_of(missing), StatusCode::BAD_REQUEST);

    let unknown = create_alert_handler(State(state.clone()), create_request("nope")).await;
    assert_eq!(status_of(unknown), StatusCode::NOT_FOUND);
    assert!(state.alert_manager.list_alerts(None).unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_and_unknown_ids() {
    let (state, _) = create_test_server_state().await;

    let invalid = get_alert_handler(State(state.clone()), Path("not-a-uuid".to_string())).await;
    let err = invalid.unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert!(err.message.contains("Invalid alert ID"));

    let invalid_ack = acknowledge_alert_handler(State(state.clone()), Path("42".to_string()), ack_request("a")).await;
    assert_eq!(status_of(invalid_ack), StatusCode::BAD_REQUEST);

    let unknown = pagerline_core::AlertId::new().to_string();
    for result in [
        resolve_alert_handler(State(state.clone()), Path(unknown.clone())).await,
        verify_alert_handler(State(state.clone()), Path(unknown.clone())).await,
        get_alert_handler(State(state.clone()), Path(unknown.clone())).await,
    ] {
        assert_eq!(status_of(result), StatusCode::NOT_FOUND);
    }
    let history = alert_notifications_handler(State(state), Path(unknown)).await;
    assert_eq!(status_of(history), StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn test_acknowledge_stops_escalation() {
    let (state, channel) = create_test_server_state().await;
    seed_chain(&state, "api", &["a", "b"]);

    let alert = created_data(create_alert_handler(State(state.clone()), create_request("api")).await);
    let id = alert.id.to_string();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let blank = acknowledge_alert_handler(State(state.clone()), Path(id.clone()), ack_request(" ")).await;
    assert_eq!(status_of(blank), StatusCode::BAD_REQUEST);

    // "b" has not been paged yet.
    let early = acknowledge_alert_handler(State(state.clone()), Path(id.clone()), ack_request("b")).await;
    assert_eq!(status_of(early), StatusCode::NOT_FOUND);

    let row = data(acknowledge_alert_handler(State(state.clone()), Path(id.clone()), ack_request("a")).await);
    assert_eq!(row.user_id, "a");
    assert_eq!(row.channel, ChannelKind::Sms);
    assert!(row.responded_at.is_some());

    state.alert_manager.runs().join(&alert.id).await;
    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert_eq!(channel.count().await, 1);

    let notifications = data(alert_notifications_handler(State(state.clone()), Path(id.clone())).await);
    assert_eq!(notifications["count"], 1);

    let escalation = data(alert_escalation_handler(State(state), Path(id)).await);
    assert_eq!(escalation["running"], false);
    assert_eq!(escalation["position"]["state"], "acknowledged");
}

#[tokio::test(start_paused = true)]
async fn test_resolve_verify_and_list() {
    let (state, _) = create_test_server_state().await;
    seed_chain(&state, "api", &["a"]);
    seed_chain(&state, "db", &["b"]);

    let open = created_data(create_alert_handler(State(state.clone()), create_request("api")).await);
    let closed = created_data(create_alert_handler(State(state.clone()), create_request("db")).await);

    let verified = data(verify_alert_handler(State(state.clone()), Path(open.id.to_string())).await);
    assert_eq!(verified.verification_status, VerificationStatus::Verified);
    assert_eq!(verified.status, AlertStatus::Active);

    let resolved = data(resolve_alert_handler(State(state.clone()), Path(closed.id.to_string())).await);
    assert_eq!(resolved.status, AlertStatus::Resolved);
    let again = data(resolve_alert_handler(State(state.clone()), Path(closed.id.to_string())).await);
    assert_eq!(again.resolved_at, resolved.resolved_at);

    let active = data(
        list_alerts_handler(
            State(state.clone()),
            Query(AlertListQuery {
                status: Some("active".to_string()),
            }),
        )
        .await,
    );
    assert_eq!(active["count"], 1);
    assert_eq!(active["alerts"][0]["id"], open.id.to_string());

    let all = data(list_alerts_handler(State(state.clone()), Query(AlertListQuery::default())).await);
    assert_eq!(all["count"], 2);

    let bad = list_alerts_handler(
        State(state.clone()),
        Query(AlertListQuery {
            status: Some("snoozed".to_string()),
        }),
    )
    .await;
    assert_eq!(status_of(bad), StatusCode::BAD_REQUEST);

    data(resolve_alert_handler(State(state.clone()), Path(open.id.to_string())).await);
    state.alert_manager.runs().join(&open.id).await;
    state.alert_manager.runs().join(&closed.id).await;
}
