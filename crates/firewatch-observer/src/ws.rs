//! `WebSocket` handler for real-time render model streaming.
//!
//! Clients connect to `GET /ws/render-model`, receive the current model
//! immediately, then one JSON text frame per published change. The stream
//! is backed by a [`watch`](tokio::sync::watch) receiver, so a slow client
//! skips intermediate models and always resumes at the latest one.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use firewatch_types::RenderModel;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming render models.
///
/// # Route
///
/// `GET /ws/render-model`
pub async fn ws_render_model(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Encode a model as a text frame. `None` if serialization fails.
fn encode(model: &RenderModel) -> Option<Message> {
    match serde_json::to_string(model) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            warn!(cycle = model.cycle, "Failed to serialize render model: {e}");
            None
        }
    }
}

/// Handle the `WebSocket` lifecycle: send the current model, then forward
/// each change until either side goes away.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let mut rx = state.store.watch();
    let initial = encode(&rx.borrow_and_update());
    let sent = match initial {
        Some(msg) => socket.send(msg).await.is_ok(),
        None => true,
    };
    if !sent {
        debug!("WebSocket client disconnected (send failed)");
        return;
    }

    loop {
        tokio::select! {
            // A new model was published.
            changed = rx.changed() => {
                if changed.is_err() {
                    debug!("Render store dropped, shutting down WebSocket");
                    return;
                }
                let next = encode(&rx.borrow_and_update());
                let Some(msg) = next else { continue };
                if socket.send(msg).await.is_err() {
                    debug!("WebSocket client disconnected (send failed)");
                    return;
                }
            }
            // Check if the client sent a close frame or disconnected.
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {
                        // Clients only listen; ignore anything else they send.
                    }
                }
            }
        }
    }
}
