//! WebSocket message types for the price stream
//!
//! These types define the protocol for WebSocket communication between
//! the server and clients. Frames are JSON objects tagged by a `type`
//! field; unknown fields on inbound frames are ignored, and unrecognized
//! frames are answered with an `error` frame instead of closing the
//! connection.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::price::PriceUpdate;
use crate::ticker::Ticker;

// ============================================================================
// Client -> Server Messages
// ============================================================================

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Attach an opaque display identity to the session
    Login {
        #[serde(default)]
        email: Option<String>,
    },
    /// Ask for the fixed supported-ticker list
    GetSupported,
    /// Add a ticker to the session's subscription set
    Subscribe { ticker: Ticker },
    /// Remove a ticker from the session's subscription set
    Unsubscribe { ticker: Ticker },
}

// ============================================================================
// Server -> Client Messages
// ============================================================================

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Acknowledges `login`, echoing the supplied identity (or null)
    LoginAck { email: Option<String> },
    /// The supported-ticker list, in server order
    Supported { supported: Vec<Ticker> },
    /// Subscription confirmed
    Subscribed { ticker: Ticker },
    /// Unsubscription confirmed (sent even when nothing was subscribed)
    Unsubscribed { ticker: Ticker },
    /// Recoverable protocol error; the connection stays open
    Error { message: String },
    /// Unsolicited full snapshot, pushed once per tick
    PriceUpdates { updates: Vec<PriceUpdate> },
}

impl ServerMessage {
    /// Error frame carrying the protocol error's wire text.
    pub fn error(err: &ProtocolError) -> Self {
        Self::Error {
            message: err.to_string(),
        }
    }
}

/// Decode one inbound text frame.
///
/// Input that is not JSON at all and JSON that matches no known message kind
/// map to the two distinct error texts clients tell apart.
pub fn decode_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(ProtocolError::InvalidJson)?;
    serde_json::from_value(value).map_err(|_| ProtocolError::UnknownMessageType)
}
