//! FrameFind Server - REST API for frame fingerprint search
//!
//! Exposes framefind-core functionality via HTTP endpoints:
//! - POST /search - Find the frames closest to an uploaded image
//! - POST /reload - Rebuild the search snapshot from disk
//! - GET /status - Report what is currently loaded
//! - GET /health, /ready - Probes

use framefind_core::FramefindError;
use framefind_server::{create_router_with_config, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env();
    let state = AppState::from_config(&config);

    // Load the initial snapshot. A corrupt store is a deployment problem
    // and refuses to start; an empty or missing store serves with zero
    // fingerprints until an ingest run and a /reload.
    match state.handle.reload(&state.data_dir, state.family) {
        Ok(snapshot) => {
            tracing::info!(
                data_dir = %state.data_dir.display(),
                index_size = snapshot.index.len(),
                family = %state.family,
                "Initial snapshot loaded"
            );
        }
        Err(e @ FramefindError::StoreCorrupt(_)) => {
            tracing::error!(error = %e, "Refusing to start with a corrupt fingerprint store");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::warn!(error = %e, "No snapshot loaded, serving until /reload succeeds");
        }
    }

    let addr = config.socket_addr();
    let app = create_router_with_config(&config, state);

    tracing::info!(%addr, "FrameFind server listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("Shutdown signal received");
}
