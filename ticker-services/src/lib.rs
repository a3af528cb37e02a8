//! Server-side services for the stock ticker streamer
//!
//! This crate provides the session registry, the WebSocket protocol
//! handler, and the interval-driven broadcast feed.

pub mod feed;
pub mod websocket;

pub use feed::{FeedConfig, PriceFeed};
pub use websocket::{SessionId, SessionRegistry, WebSocketState};
