use axum::Json;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;

use skirmish_core::net::protocol::{MAX_MESSAGE_SIZE, decode_signal_request, encode_signal_event};
use skirmish_core::net::signal::SignalEvent;
use skirmish_core::player::PeerId;

use crate::AppState;
use crate::config::RelayConfig;

pub async fn relay_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.max_message_size(MAX_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_relay_socket(socket, state))
}

/// Registered peer count, for health checks.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let relay = state.relay.read().await;
    Json(serde_json::json!({ "peers": relay.peer_count() }))
}

async fn handle_relay_socket(socket: WebSocket, state: AppState) {
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<SignalEvent>();
    spawn_relay_writer(ws_sender, rx);

    let mut name: Option<PeerId> = None;
    let mut budget = MessageBudget::from_config(&state.config, Instant::now());

    while let Some(Ok(msg)) = ws_receiver.next().await {
        let text = match msg {
            Message::Text(t) => t,
            Message::Close(_) => break,
            _ => continue,
        };

        if text.as_str().len() > MAX_MESSAGE_SIZE {
            tracing::warn!(peer = ?name, size = text.as_str().len(), "Oversized message dropped");
            continue;
        }

        if !budget.try_spend(Instant::now()) {
            if budget.refused == 1 {
                tracing::warn!(peer = ?name, "Peer rate limited");
            }
            continue;
        }

        let request = match decode_signal_request(text.as_str()) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(peer = ?name, error = %e, "Malformed signal request dropped");
                continue;
            },
        };

        let mut relay = state.relay.write().await;
        relay.handle(&mut name, request, &tx);
    }

    // Connection gone: free the name and close its links
    if let Some(name) = name {
        let mut relay = state.relay.write().await;
        relay.release(&name);
        tracing::info!(peer = %name, "Peer disconnected");
    }
}

fn spawn_relay_writer(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<SignalEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match encode_signal_event(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to encode signal event");
                    continue;
                },
            };
            if ws_sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });
}

/// Per-connection allowance of signal requests. Starts full at
/// `RelayConfig::burst` and regains `RelayConfig::messages_per_sec`.
#[derive(Debug)]
struct MessageBudget {
    available: f64,
    capacity: f64,
    per_sec: f64,
    checked_at: Instant,
    /// Requests refused since the last accepted one.
    refused: u32,
}

impl MessageBudget {
    fn from_config(config: &RelayConfig, now: Instant) -> Self {
        Self {
            available: config.burst,
            capacity: config.burst,
            per_sec: config.messages_per_sec.max(0.0),
            checked_at: now,
            refused: 0,
        }
    }

    /// Spend one request at `now`, or refuse it if the budget is empty.
    fn try_spend(&mut self, now: Instant) -> bool {
        let earned = now.saturating_duration_since(self.checked_at).as_secs_f64() * self.per_sec;
        self.available = (self.available + earned).min(self.capacity);
        self.checked_at = now;
        if self.available < 1.0 {
            self.refused = self.refused.saturating_add(1);
            return false;
        }
        self.available -= 1.0;
        self.refused = 0;
        true
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(burst: f64, messages_per_sec: f64) -> RelayConfig {
        RelayConfig {
            burst,
            messages_per_sec,
            ..RelayConfig::default()
        }
    }

    #[test]
    fn budget_caps_bursts() {
        let start = Instant::now();
        let mut budget = MessageBudget::from_config(&config(3.0, 0.0), start);
        assert!(budget.try_spend(start));
        assert!(budget.try_spend(start));
        assert!(budget.try_spend(start));
        assert!(!budget.try_spend(start));
        assert!(!budget.try_spend(start + Duration::from_secs(60)));
        assert_eq!(budget.refused, 2);
    }

    #[test]
    fn budget_refills_at_configured_rate() {
        let start = Instant::now();
        let mut budget = MessageBudget::from_config(&config(1.0, 50.0), start);
        assert!(budget.try_spend(start));
        assert!(!budget.try_spend(start + Duration::from_millis(10)));
        assert!(budget.try_spend(start + Duration::from_millis(40)));
        assert_eq!(budget.refused, 0);
    }

    #[test]
    fn refill_never_exceeds_burst() {
        let start = Instant::now();
        let mut budget = MessageBudget::from_config(&config(2.0, 1000.0), start);
        let later = start + Duration::from_secs(10);
        assert!(budget.try_spend(later));
        assert!(budget.try_spend(later));
        assert!(!budget.try_spend(later));
    }
}
