use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticket_relay::config::RelayConfig;
use ticket_relay::queue::MemoryWorkQueue;
use ticket_relay::server::{AppState, build_router};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ticket_relay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RelayConfig::from_env();
    tracing::info!(
        safety_margin_secs = config.timeouts.safety_margin_secs,
        upstream_limit_secs = config.timeouts.upstream_limit_secs,
        default_client_timeout_secs = config.timeouts.default_client_timeout_secs,
        "Loaded configuration"
    );

    let app_state = AppState::new(Arc::new(MemoryWorkQueue::new()), config.timeouts.clone());
    let app = build_router(app_state.clone());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(app_state))
        .await
}

/// Resolves on Ctrl-C, after telling the parked worker to reconnect. Polls
/// that arrive while connections drain are turned away too, so none of them
/// holds the graceful shutdown open for a full budget.
async fn shutdown_signal(app_state: AppState) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutting down");
    app_state.slot().close();
}
