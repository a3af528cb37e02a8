//! Core types for the stock ticker streamer
//!
//! This crate defines the shared data structures used across the streamer:
//! ticker symbols and the fixed supported set, the simulated price state,
//! and the JSON wire protocol spoken over WebSocket.

pub mod error;
pub mod price;
pub mod ticker;
pub mod websocket;

pub use error::{ConfigError, ProtocolError};
pub use price::{PriceState, PriceUpdate};
pub use ticker::{SupportedTickers, Ticker, DEFAULT_TICKERS};
pub use websocket::{decode_client_message, ClientMessage, ServerMessage};
