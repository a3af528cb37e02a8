//! End-to-end WebSocket protocol tests against the real router.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use ticker_api::{app, AppState};
use ticker_core::{PriceState, SupportedTickers};
use ticker_services::{FeedConfig, PriceFeed, SessionRegistry, WebSocketState};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Spin up the router plus a fast broadcast feed on an ephemeral port.
async fn start_server(tickers: &str, interval: Duration) -> (String, watch::Sender<bool>) {
    let supported = SupportedTickers::parse(tickers).unwrap();
    let registry = Arc::new(SessionRegistry::new(supported.clone()));
    let ws_state = WebSocketState::new(Arc::clone(&registry));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let feed = PriceFeed::new(
        PriceState::new(supported),
        Arc::clone(&registry),
        FeedConfig {
            broadcast_interval: interval,
        },
    );
    tokio::spawn(feed.run(shutdown_rx));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = app(AppState { ws_state });
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("ws://{}/ws", addr), shutdown_tx)
}

async fn send(ws: &mut WsClient, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

/// Next text frame, parsed.
async fn recv_json(ws: &mut WsClient) -> Value {
    loop {
        let frame = tokio::time::timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .expect("transport error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("frame is not JSON");
        }
    }
}

/// Next frame that is not an unsolicited price broadcast.
async fn recv_reply(ws: &mut WsClient) -> Value {
    loop {
        let value = recv_json(ws).await;
        if value["type"] != "price_updates" {
            return value;
        }
    }
}

/// Next price broadcast, skipping interleaved replies.
async fn recv_updates(ws: &mut WsClient) -> Value {
    loop {
        let value = recv_json(ws).await;
        if value["type"] == "price_updates" {
            return value;
        }
    }
}

#[tokio::test]
async fn full_protocol_scenario() {
    let (url, _shutdown) = start_server("GOOG,TSLA", Duration::from_millis(50)).await;
    let (mut ws, _) = connect_async(url.as_str()).await.unwrap();

    // supported-ticker query
    send(&mut ws, json!({"type": "get_supported"})).await;
    assert_eq!(
        recv_reply(&mut ws).await,
        json!({"type": "supported", "supported": ["GOOG", "TSLA"]})
    );

    // subscribe to a supported ticker
    send(&mut ws, json!({"type": "subscribe", "ticker": "GOOG"})).await;
    assert_eq!(
        recv_reply(&mut ws).await,
        json!({"type": "subscribed", "ticker": "GOOG"})
    );

    // the snapshot covers every supported ticker, not just the subscription
    let updates = recv_updates(&mut ws).await;
    let entries = updates["updates"].as_array().unwrap();
    let symbols: Vec<&str> = entries
        .iter()
        .map(|u| u["ticker"].as_str().unwrap())
        .collect();
    assert_eq!(symbols, ["GOOG", "TSLA"]);
    for entry in entries {
        assert!(entry["price"].as_f64().unwrap() > 0.0);
        assert!(entry["ts"].as_i64().unwrap() > 0);
    }

    // unsupported ticker is refused without closing the connection
    send(&mut ws, json!({"type": "subscribe", "ticker": "XOM"})).await;
    assert_eq!(
        recv_reply(&mut ws).await,
        json!({"type": "error", "message": "Unsupported ticker"})
    );

    // identity is echoed back
    send(
        &mut ws,
        json!({"type": "login", "email": "trader@example.com"}),
    )
    .await;
    assert_eq!(
        recv_reply(&mut ws).await,
        json!({"type": "login_ack", "email": "trader@example.com"})
    );

    // unsubscribe acknowledges even when repeated
    for _ in 0..2 {
        send(&mut ws, json!({"type": "unsubscribe", "ticker": "GOOG"})).await;
        assert_eq!(
            recv_reply(&mut ws).await,
            json!({"type": "unsubscribed", "ticker": "GOOG"})
        );
    }
}

#[tokio::test]
async fn protocol_errors_leave_the_session_usable() {
    let (url, _shutdown) = start_server("GOOG,TSLA", Duration::from_secs(3600)).await;
    let (mut ws, _) = connect_async(url.as_str()).await.unwrap();

    ws.send(Message::Text("not json".into())).await.unwrap();
    assert_eq!(
        recv_reply(&mut ws).await,
        json!({"type": "error", "message": "Invalid JSON"})
    );

    send(&mut ws, json!({"type": "quote", "ticker": "GOOG"})).await;
    assert_eq!(
        recv_reply(&mut ws).await,
        json!({"type": "error", "message": "Unknown message type"})
    );

    // still able to operate normally afterwards
    send(&mut ws, json!({"type": "subscribe", "ticker": "TSLA"})).await;
    assert_eq!(
        recv_reply(&mut ws).await,
        json!({"type": "subscribed", "ticker": "TSLA"})
    );
}

#[tokio::test]
async fn reconnect_starts_with_a_fresh_session() {
    let (url, _shutdown) = start_server("GOOG,TSLA", Duration::from_secs(3600)).await;

    let (mut ws, _) = connect_async(url.as_str()).await.unwrap();
    send(&mut ws, json!({"type": "subscribe", "ticker": "GOOG"})).await;
    assert_eq!(
        recv_reply(&mut ws).await,
        json!({"type": "subscribed", "ticker": "GOOG"})
    );
    ws.close(None).await.unwrap();

    // a new connection carries no state over; the client replays subscribes
    let (mut ws, _) = connect_async(url.as_str()).await.unwrap();
    send(&mut ws, json!({"type": "subscribe", "ticker": "GOOG"})).await;
    assert_eq!(
        recv_reply(&mut ws).await,
        json!({"type": "subscribed", "ticker": "GOOG"})
    );
}
