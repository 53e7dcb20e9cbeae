//! Graceful shutdown handling for the web server.

use tracing::{error, info};

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
///
/// A handler that fails to install is logged and never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(category = "server", error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(category = "server", error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!(category = "server", "Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!(category = "server", "Received SIGTERM, starting graceful shutdown");
        }
    }
}
