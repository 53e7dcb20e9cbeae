//! Application router configuration.

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::types::{ServerState, MAX_REQUEST_BODY_SIZE};

/// Create the application router with a specific state.
pub fn create_router(state: ServerState) -> Router {
    use crate::handlers::{alerts, basic, channels, escalation, services, users};

    Router::new()
        .route("/api/health", get(basic::health_handler))
        // Services
        .route(
            "/api/services",
            get(services::list_services_handler).post(services::create_service_handler),
        )
        .route(
            "/api/services/:id",
            get(services::get_service_handler)
                .put(services::update_service_handler)
                .delete(services::delete_service_handler),
        )
        .route("/api/services/:id/check", post(services::check_service_handler))
        .route(
            "/api/services/:id/health/history",
            get(services::health_history_handler),
        )
        // Users
        .route(
            "/api/users",
            get(users::list_users_handler).post(users::create_user_handler),
        )
        .route(
            "/api/users/:id",
            get(users::get_user_handler)
                .put(users::update_user_handler)
                .delete(users::delete_user_handler),
        )
        // Escalation chains
        .route("/api/escalation", post(escalation::set_chain_entry_handler))
        .route("/api/escalation/:service_id", get(escalation::get_chain_handler))
        .route(
            "/api/escalation/:service_id/:level",
            delete(escalation::delete_chain_entry_handler),
        )
        // Notification channels
        .route("/api/channels", get(channels::list_channels_handler))
        // Alerts
        .route(
            "/api/alerts",
            get(alerts::list_alerts_handler).post(alerts::create_alert_handler),
        )
        .route("/api/alerts/:id", get(alerts::get_alert_handler))
        .route("/api/alerts/:id/notifications", get(alerts::alert_notifications_handler))
        .route("/api/alerts/:id/escalation", get(alerts::alert_escalation_handler))
        .route("/api/alerts/:id/resolve", post(alerts::resolve_alert_handler))
        .route("/api/alerts/:id/verify", post(alerts::verify_alert_handler))
        .route("/api/alerts/:id/acknowledge", post(alerts::acknowledge_alert_handler))
        .layer(tower_http::limit::RequestBodyLimitLayer::new(
            MAX_REQUEST_BODY_SIZE,
        ))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}
