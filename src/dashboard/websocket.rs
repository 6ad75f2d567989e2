//! WebSocket handler for real-time dashboard updates

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::HeaderMap,
    response::Response,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::api::{auth, AppState};
use crate::dashboard::types::DashboardUpdate;
use crate::session::ActivitySignal;

/// Largest update forwarded to a client
const MAX_MESSAGE_BYTES: usize = 10 * 1024;

/// Handles WebSocket upgrade requests for dashboard real-time updates
///
/// Activity frames only count when the upgrade request carried the session
/// cookie of the logged-in client.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let token = auth::session_token(&headers).map(str::to_string);
    ws.on_upgrade(move |socket| handle_socket(socket, state, token))
}

/// Handles an established WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, token: Option<String>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe to broadcast channel
    let mut rx = state.ws_broadcast.subscribe();

    // Spawn task to forward broadcast messages to WebSocket
    let send_task = tokio::spawn(async move {
        loop {
            let update = match rx.recv().await {
                Ok(update) => update,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Dashboard client lagging, updates skipped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let Some(json) = encode_update(&update) else {
                continue;
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Incoming text frames are activity signals for the idle timeout
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => break,
                Message::Text(text) => {
                    apply_activity(&state, token.as_deref(), &text);
                }
                _ => {
                    // axum answers pings; other frames are ignored
                }
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }
}

/// Reset the idle timeout for an activity frame from the session's client.
/// Returns whether the timer was reset.
fn apply_activity(state: &AppState, token: Option<&str>, text: &str) -> bool {
    let Some(signal) = parse_activity(text) else {
        return false;
    };
    if !state.binding.is_bound(token) {
        tracing::trace!(?signal, "Ignoring activity from unbound client");
        return false;
    }
    state.session.record_activity(signal)
}

/// Serialize an update, skipping oversized messages instead of truncating
fn encode_update(update: &DashboardUpdate) -> Option<String> {
    match serde_json::to_string(update) {
        Ok(json) if json.len() > MAX_MESSAGE_BYTES => {
            tracing::warn!(
                "WebSocket message exceeds 10KB limit ({}B), skipping",
                json.len()
            );
            None
        }
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!("Failed to serialize WebSocket update: {}", e);
            None
        }
    }
}

/// Parse `{"signal": "pointer_move" | "key_press" | "click"}`
fn parse_activity(text: &str) -> Option<ActivitySignal> {
    #[derive(serde::Deserialize)]
    struct ActivityFrame {
        signal: ActivitySignal,
    }
    serde_json::from_str::<ActivityFrame>(text)
        .ok()
        .map(|frame| frame.signal)
}
