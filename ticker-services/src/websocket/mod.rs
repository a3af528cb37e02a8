//! WebSocket infrastructure for the price stream
//!
//! This module provides the per-connection session registry and the
//! protocol handler that turns inbound frames into responses.

mod handler;
mod session;

pub use handler::WebSocketState;
pub use session::{SessionId, SessionRegistry};
