//! WebSocket upgrade handler.
//!
//! Authentication happens upstream; the fronting auth layer forwards the
//! established identity as query parameters. The handler registers the
//! connection with the coordinator, forwards outbound events, and feeds
//! inbound events back — strictly in receipt order per connection.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use chathub_core::types::id::UserId;
use chathub_realtime::event::{ClientEvent, ServerEvent};

use crate::state::AppState;

/// Authenticated identity forwarded by the upstream auth layer.
#[derive(Debug, serde::Deserialize)]
pub struct WsIdentity {
    /// Authenticated user id.
    pub user_id: UserId,
    /// Display username.
    pub username: String,
}

/// GET /ws?user_id={uuid}&username={name} — WebSocket upgrade
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    Query(identity): Query<WsIdentity>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, identity, socket))
}

/// Drives an established WebSocket connection.
async fn handle_socket(state: AppState, identity: WsIdentity, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handle, mut outbound_rx) = state
        .coordinator
        .connect(identity.user_id, identity.username);
    let conn_id = handle.id;

    info!(
        conn_id = %conn_id,
        user_id = %identity.user_id,
        "WebSocket connection established"
    );

    // Forward coordinator events out to the client.
    let outbound_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(conn_id = %conn_id, error = %e, "Failed to serialize outbound event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Process inbound events in receipt order.
    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => state.coordinator.handle_event(&conn_id, event).await,
                Err(e) => {
                    debug!(conn_id = %conn_id, error = %e, "Unparseable client event");
                    handle.send(ServerEvent::MessageError {
                        code: "SERIALIZATION".to_string(),
                        error: format!("Failed to parse event: {e}"),
                    });
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    outbound_task.abort();
    state.coordinator.disconnect(&conn_id);

    info!(
        conn_id = %conn_id,
        user_id = %identity.user_id,
        "WebSocket connection closed"
    );
}
