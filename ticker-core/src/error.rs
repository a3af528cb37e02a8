//! Error types for the streamer

use thiserror::Error;

use crate::ticker::Ticker;

/// Protocol-level errors reported back to the originating session.
///
/// Both kinds are recoverable: the connection stays open and the client
/// receives an `error` frame in place of an acknowledgement. The `Display`
/// text of each variant is exactly what goes on the wire.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The inbound payload was not well-formed JSON.
    #[error("Invalid JSON")]
    InvalidJson(#[source] serde_json::Error),

    /// Well-formed JSON that does not match any known message kind.
    #[error("Unknown message type")]
    UnknownMessageType,

    /// Subscribe request for a ticker outside the supported set.
    #[error("Unsupported ticker")]
    UnsupportedTicker(Ticker),
}

/// Startup configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("supported ticker set must not be empty")]
    EmptyTickerSet,

    #[error("duplicate ticker in supported set: {0}")]
    DuplicateTicker(Ticker),
}
