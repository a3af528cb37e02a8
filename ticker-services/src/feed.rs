//! Price Feed Service
//!
//! Background service that advances the simulated prices on a fixed
//! interval and pushes the resulting snapshot to every live session.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use ticker_core::{PriceState, ServerMessage};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::websocket::SessionRegistry;

/// Configuration for the price feed
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Wall-clock delay between snapshot broadcasts
    pub broadcast_interval: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            broadcast_interval: Duration::from_secs(1),
        }
    }
}

/// Fixed-interval broadcast feed.
///
/// Owns the [`PriceState`] outright: nothing else writes prices, and each
/// tick's snapshot is built on this task after the advance phase completes,
/// so every session observes the same fully-advanced values.
pub struct PriceFeed {
    prices: PriceState,
    registry: Arc<SessionRegistry>,
    config: FeedConfig,
}

impl PriceFeed {
    /// Create a feed over the given price state and session registry.
    pub fn new(prices: PriceState, registry: Arc<SessionRegistry>, config: FeedConfig) -> Self {
        Self {
            prices,
            registry,
            config,
        }
    }

    /// Advance every ticker once, then broadcast the snapshot to all sessions.
    pub fn tick(&mut self) {
        self.prices.advance_all();
        let updates = self.prices.snapshot(Utc::now().timestamp_millis());
        debug!(
            "broadcasting {} prices to {} sessions",
            updates.len(),
            self.registry.session_count()
        );
        self.registry
            .broadcast_all(&ServerMessage::PriceUpdates { updates });
    }

    /// Run the broadcast loop until `shutdown` flips to true.
    ///
    /// The timer stops before session resources are torn down, so shutdown
    /// can never race a tick into closed connections.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "price feed started ({:?} interval)",
            self.config.broadcast_interval
        );

        let mut ticker = interval(self.config.broadcast_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick of a fresh interval fires immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("price feed stopping");
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use ticker_core::{SupportedTickers, Ticker};
    use tokio::sync::mpsc;

    fn feed_fixture(interval: Duration) -> (PriceFeed, Arc<SessionRegistry>) {
        let supported = SupportedTickers::parse("GOOG,TSLA").unwrap();
        let registry = Arc::new(SessionRegistry::new(supported.clone()));
        let feed = PriceFeed::new(
            PriceState::new(supported),
            Arc::clone(&registry),
            FeedConfig {
                broadcast_interval: interval,
            },
        );
        (feed, registry)
    }

    #[tokio::test]
    async fn tick_delivers_one_identical_snapshot_per_session() {
        let (mut feed, registry) = feed_fixture(Duration::from_secs(1));
        let (tx_a, mut rx_a) = mpsc::channel(8);
        let (tx_b, mut rx_b) = mpsc::channel(8);
        registry.register(tx_a);
        registry.register(tx_b);

        feed.tick();

        let message_a = rx_a.try_recv().unwrap();
        let message_b = rx_b.try_recv().unwrap();
        assert_eq!(message_a, message_b);
        // exactly one message per tick
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_err());

        let ServerMessage::PriceUpdates { updates } = message_a else {
            panic!("expected price_updates");
        };
        let symbols: Vec<&str> = updates.iter().map(|u| u.ticker.as_str()).collect();
        assert_eq!(symbols, ["GOOG", "TSLA"]);
        assert!(updates.iter().all(|u| u.price > Decimal::ZERO));
        assert!(updates.iter().all(|u| u.ts == updates[0].ts));
    }

    #[tokio::test]
    async fn snapshot_covers_all_tickers_regardless_of_subscriptions() {
        let (mut feed, registry) = feed_fixture(Duration::from_secs(1));
        let (tx, mut rx) = mpsc::channel(8);
        let session = registry.register(tx);
        registry.subscribe(session, Ticker::from("GOOG")).unwrap();

        feed.tick();

        let ServerMessage::PriceUpdates { updates } = rx.try_recv().unwrap() else {
            panic!("expected price_updates");
        };
        assert_eq!(updates.len(), 2);
    }

    #[tokio::test]
    async fn session_closed_before_tick_receives_nothing() {
        let (mut feed, registry) = feed_fixture(Duration::from_secs(1));
        let (tx_open, mut rx_open) = mpsc::channel(8);
        let (tx_closed, mut rx_closed) = mpsc::channel(8);
        registry.register(tx_open);
        let closed = registry.register(tx_closed);

        registry.deregister(closed);
        feed.tick();

        assert!(rx_open.try_recv().is_ok());
        assert!(rx_closed.try_recv().is_err());
    }

    #[tokio::test]
    async fn run_broadcasts_until_shutdown() {
        let (feed, registry) = feed_fixture(Duration::from_millis(10));
        let (tx, mut rx) = mpsc::channel(64);
        registry.register(tx);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(feed.run(shutdown_rx));

        let first = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("feed should broadcast before the timeout")
            .expect("channel open");
        assert!(matches!(first, ServerMessage::PriceUpdates { .. }));

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("feed should stop after shutdown")
            .unwrap();
    }

    #[tokio::test]
    async fn run_stops_when_shutdown_sender_is_dropped() {
        let (feed, _registry) = feed_fixture(Duration::from_millis(10));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(feed.run(shutdown_rx));

        drop(shutdown_tx);
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("feed should stop once the shutdown channel is gone")
            .unwrap();
    }
}
