use crate::config::RelayConfig;
use crate::room::RoomRegistry;
use crate::signaling::{SignalRelay, SignalingService, ws_handler};
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub signaling: SignalingService,
    pub relay: SignalRelay,
}

impl AppState {
    pub fn new(config: &RelayConfig) -> Self {
        let signaling = SignalingService::new();
        let registry = Arc::new(RoomRegistry::new(config.capacity));
        let relay = SignalRelay::new(registry, Arc::new(signaling.clone()));

        Self { signaling, relay }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}

/// Binds `config.bind_addr` and serves the relay until the process stops.
pub async fn serve(config: RelayConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    serve_on(listener, config).await
}

pub async fn serve_on(listener: TcpListener, config: RelayConfig) -> Result<()> {
    let state = AppState::new(&config);
    let addr = listener.local_addr().context("Listener has no address")?;

    info!(
        "Signaling relay listening on ws://{}/ws (room capacity {})",
        addr, config.capacity
    );

    axum::serve(listener, router(state))
        .await
        .context("Signaling relay stopped")
}
