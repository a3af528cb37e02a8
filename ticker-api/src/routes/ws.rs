//! WebSocket route handler
//!
//! Handles the WebSocket upgrade, registers a session for the connection's
//! lifetime, and runs the paired reader/writer tasks.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use ticker_core::{ProtocolError, ServerMessage};
use ticker_services::WebSocketState;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::AppState;

/// Outgoing channel depth per connection. A session that falls this far
/// behind starts losing broadcasts rather than stalling the feed.
const OUTGOING_BUFFER: usize = 64;

/// Create WebSocket routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_handler))
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.ws_state))
}

/// Drive one connection until the transport closes.
///
/// The writer task drains the session's outgoing channel into the socket;
/// the reader loop feeds inbound frames through the protocol handler. The
/// session is deregistered the moment either side ends, so no later tick
/// can deliver to it.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<ServerMessage>(OUTGOING_BUFFER);
    let session = state.registry().register(outgoing_tx);
    info!("New WebSocket connection: {}", session);

    // Writer: ends when the session is deregistered (sender dropped) or the
    // transport rejects a write.
    let send_task = tokio::spawn(async move {
        while let Some(message) = outgoing_rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Reader: one response per inbound frame.
    let recv_state = state.clone();
    let recv_task = async move {
        while let Some(result) = ws_receiver.next().await {
            let message = match result {
                Ok(message) => message,
                Err(e) => {
                    debug!("WebSocket error for {}: {}", session, e);
                    break;
                }
            };

            match message {
                Message::Text(text) => {
                    let response = recv_state.handle_text(session, text.as_str());
                    recv_state.registry().send(session, response);
                }
                Message::Binary(_) => {
                    recv_state.registry().send(
                        session,
                        ServerMessage::error(&ProtocolError::UnknownMessageType),
                    );
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // handled at the protocol level by axum
                }
                Message::Close(_) => {
                    debug!("Received close from {}", session);
                    break;
                }
            }
        }
    };

    // Wait for either side to finish (connection closed)
    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    state.registry().deregister(session);
    info!("WebSocket connection closed: {}", session);
}
