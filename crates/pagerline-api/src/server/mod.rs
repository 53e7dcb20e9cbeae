//! HTTP server: state, routes and the serve loop.

mod router;
mod types;

pub use router::create_router;
pub use types::{configure_channels, ServerState, MAX_REQUEST_BODY_SIZE};

use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::shutdown::shutdown_signal;

/// Run the server until Ctrl+C or SIGTERM.
///
/// Interrupted escalations are resumed before the listener opens. Runs
/// still in flight at shutdown keep their `Running` position and are
/// picked up again by the next start.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr()?;
    let health = config.health.clone();
    let state = ServerState::build(config).await?;

    match state.alert_manager.recover() {
        Ok(0) => {}
        Ok(n) => info!(category = "server", resumed = n, "Resumed interrupted escalations"),
        Err(e) => error!(category = "server", error = %e, "Failed to recover escalations"),
    }

    let monitor = health.enabled.then(|| {
        info!(
            category = "server",
            interval_secs = health.interval_secs,
            "Starting health monitor"
        );
        state
            .health_monitor
            .clone()
            .start(Duration::from_secs(health.interval_secs))
    });

    let app = create_router(state.clone());
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(category = "server", %addr, "Pagerline listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(monitor) = monitor {
        monitor.stop().await;
    }
    info!(
        category = "server",
        active_escalations = state.alert_manager.runs().active_count(),
        uptime_secs = chrono::Utc::now().timestamp() - state.started_at,
        "Server stopped"
    );
    served.context("server error")
}
