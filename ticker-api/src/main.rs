//! Stock Ticker Streaming Server
//!
//! WebSocket server that streams simulated stock prices to browser clients.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ticker_api::{app, AppState};
use ticker_core::{PriceState, SupportedTickers, Ticker};
use ticker_services::{FeedConfig, PriceFeed, SessionRegistry, WebSocketState};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ticker_api=debug")),
        )
        .init();

    info!("Starting Stock Ticker Streaming Server");

    // Supported tickers and broadcast interval are fixed for the process lifetime
    let supported = match std::env::var("TICKERS") {
        Ok(list) => SupportedTickers::parse(&list)?,
        Err(_) => SupportedTickers::default(),
    };
    info!(
        "Supported tickers: {}",
        supported
            .as_slice()
            .iter()
            .map(Ticker::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let feed_config = FeedConfig {
        broadcast_interval: std::env::var("FEED_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or_else(|| FeedConfig::default().broadcast_interval),
    };

    let registry = Arc::new(SessionRegistry::new(supported.clone()));
    let ws_state = WebSocketState::new(Arc::clone(&registry));

    // Start the broadcast feed in the background
    let prices = PriceState::new(supported);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let feed = PriceFeed::new(prices, Arc::clone(&registry), feed_config);
    let feed_handle = tokio::spawn(feed.run(shutdown_rx));

    // Build router
    let state = AppState { ws_state };
    let app = app(state);

    // Start server
    let port = std::env::var("SERVER_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(4000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop the feed timer before the session registry goes away
    let _ = shutdown_tx.send(true);
    feed_handle.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
