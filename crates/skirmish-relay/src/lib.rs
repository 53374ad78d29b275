//! Rendezvous service for Skirmish peers.
//!
//! Peers register a unique name over a WebSocket, ask to be linked with
//! another registered name, and then exchange opaque text payloads over
//! that link. The relay never inspects payloads.

pub mod config;
pub mod registry;
pub mod ws;

use std::sync::Arc;

use axum::Router;
use tokio::sync::RwLock;

use config::RelayConfig;
use registry::{RelayState, SharedRelayState};

/// Per-router state handed to each socket task.
#[derive(Clone)]
pub struct AppState {
    pub relay: SharedRelayState,
    pub config: Arc<RelayConfig>,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            relay: Arc::new(RwLock::new(RelayState::new(config.max_peers))),
            config: Arc::new(config),
        }
    }
}

/// Build the Axum router and relay state from a config.
pub fn build_app(config: RelayConfig) -> (Router<()>, AppState) {
    let state = AppState::new(config);
    let app = Router::new()
        .route("/relay", axum::routing::get(ws::relay_ws_handler))
        .route("/status", axum::routing::get(ws::status))
        .with_state(state.clone());
    (app, state)
}
