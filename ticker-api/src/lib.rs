//! Stock Ticker Streaming Server
//!
//! Axum application exposing the WebSocket price stream and health routes.

mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use ticker_services::WebSocketState;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub ws_state: WebSocketState,
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    // Configure CORS for the browser frontend
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", routes::api_routes())
        .merge(routes::ws_routes())
        .layer(cors)
        .with_state(state)
}
