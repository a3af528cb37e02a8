//! WebSocket protocol handler
//!
//! Decodes inbound text frames and dispatches them against the session
//! registry. Every inbound frame produces exactly one response frame;
//! protocol failures are answered with an `error` frame and leave the
//! session open and its state untouched.

use std::sync::Arc;

use ticker_core::{decode_client_message, ClientMessage, ServerMessage};
use tracing::debug;

use super::session::{SessionId, SessionRegistry};

/// Shared state for WebSocket handlers
#[derive(Clone)]
pub struct WebSocketState {
    registry: Arc<SessionRegistry>,
}

impl WebSocketState {
    /// Create WebSocket state over a session registry.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// The underlying session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Handle one inbound text frame, returning the response to send back.
    pub fn handle_text(&self, session: SessionId, text: &str) -> ServerMessage {
        let message = match decode_client_message(text) {
            Ok(message) => message,
            Err(err) => {
                debug!("{} sent undecodable frame: {}", session, err);
                return ServerMessage::error(&err);
            }
        };

        match message {
            ClientMessage::Login { email } => {
                self.registry.identify(session, email.clone());
                ServerMessage::LoginAck { email }
            }
            ClientMessage::GetSupported => ServerMessage::Supported {
                supported: self.registry.supported().as_slice().to_vec(),
            },
            ClientMessage::Subscribe { ticker } => {
                match self.registry.subscribe(session, ticker.clone()) {
                    Ok(()) => ServerMessage::Subscribed { ticker },
                    Err(err) => ServerMessage::error(&err),
                }
            }
            ClientMessage::Unsubscribe { ticker } => {
                self.registry.unsubscribe(session, &ticker);
                ServerMessage::Unsubscribed { ticker }
            }
        }
    }
}

impl std::fmt::Debug for WebSocketState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketState")
            .field("registry", &self.registry)
            .finish()
    }
}
