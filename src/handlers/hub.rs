//! Websocket endpoint of the dashboard hub.

use crate::hub::{Hub, HubMessage};
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use tokio::sync::broadcast::error::RecvError;

/// Frames may be terminated by the ASCII record separator.
const RECORD_SEPARATOR: char = '\u{1e}';

/// GET /api/dashboard/hub
pub async fn connect(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| session(socket, state.hub))
}

async fn session(mut socket: WebSocket, hub: Hub) {
    let mut rx = hub.subscribe();
    tracing::debug!("hub client connected");
    loop {
        tokio::select! {
            published = rx.recv() => match published {
                Ok(msg) => {
                    let Ok(text) = serde_json::to_string(&msg) else { continue };
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "hub client lagging, messages dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    for reply in handle_text(&hub, &text) {
                        if socket.send(Message::Text(reply)).await.is_err() {
                            return;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    tracing::debug!("hub client disconnected");
}

/// Handle one text message (possibly several separated frames). Returns direct replies.
/// A protocol handshake (`{"protocol":"json",...}`) is acknowledged with `{}`;
/// invocations are rebroadcast; anything else is logged and dropped.
pub fn handle_text(hub: &Hub, text: &str) -> Vec<String> {
    let mut replies = Vec::new();
    for frame in text.split(RECORD_SEPARATOR).map(str::trim).filter(|f| !f.is_empty()) {
        let value: serde_json::Value = match serde_json::from_str(frame) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed hub frame");
                continue;
            }
        };
        if value.get("protocol").is_some() {
            replies.push("{}".to_string());
            continue;
        }
        match serde_json::from_value::<HubMessage>(value) {
            Ok(msg) => {
                if let Err(e) = hub.dispatch(msg) {
                    tracing::debug!(error = %e, "rejected hub invocation");
                }
            }
            Err(e) => tracing::debug!(error = %e, "ignoring hub frame"),
        }
    }
    replies
}
