//! Simulated price state
//!
//! Prices carry exactly two decimal places, stay strictly positive, and move
//! by a bounded random step each tick.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ticker::{SupportedTickers, Ticker};

/// Lowest price a ticker can reach after a perturbation.
fn price_floor() -> Decimal {
    Decimal::new(1, 2)
}

/// One entry of a tick snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdate {
    pub ticker: Ticker,
    /// Two-decimal price, serialized as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
}

/// Current price per supported ticker plus the generator that perturbs them.
///
/// The type owns its RNG so independent instances can coexist and tests can
/// seed it deterministically. Prices are seeded uniformly in
/// `[100.00, 1000.00)` and each step is uniform in `[-1.00, +1.00]` in whole
/// cents, clamped so a price never drops below `0.01`.
#[derive(Debug)]
pub struct PriceState {
    supported: SupportedTickers,
    prices: HashMap<Ticker, Decimal>,
    rng: StdRng,
}

impl PriceState {
    /// Seed every supported ticker from OS entropy.
    pub fn new(supported: SupportedTickers) -> Self {
        Self::with_rng(supported, StdRng::from_os_rng())
    }

    /// Seed every supported ticker using the given RNG.
    pub fn with_rng(supported: SupportedTickers, mut rng: StdRng) -> Self {
        let prices = supported
            .as_slice()
            .iter()
            .map(|ticker| (ticker.clone(), Decimal::new(rng.random_range(10_000..100_000), 2)))
            .collect();
        Self {
            supported,
            prices,
            rng,
        }
    }

    /// The supported set this state was built from.
    pub fn supported(&self) -> &SupportedTickers {
        &self.supported
    }

    /// Current price, if the ticker is supported.
    pub fn price(&self, ticker: &Ticker) -> Option<Decimal> {
        self.prices.get(ticker).copied()
    }

    /// Apply one bounded step to `ticker`. Unknown tickers are left untouched.
    pub fn advance(&mut self, ticker: &Ticker) {
        if let Some(price) = self.prices.get_mut(ticker) {
            perturb(price, &mut self.rng);
        }
    }

    /// Advance every supported ticker exactly once, in supported-set order.
    pub fn advance_all(&mut self) {
        for ticker in self.supported.as_slice() {
            if let Some(price) = self.prices.get_mut(ticker) {
                perturb(price, &mut self.rng);
            }
        }
    }

    /// Snapshot of every price in supported-set order, all stamped with `ts`.
    pub fn snapshot(&self, ts: i64) -> Vec<PriceUpdate> {
        self.supported
            .as_slice()
            .iter()
            .filter_map(|ticker| {
                self.prices.get(ticker).map(|price| PriceUpdate {
                    ticker: ticker.clone(),
                    price: *price,
                    ts,
                })
            })
            .collect()
    }
}

fn perturb(price: &mut Decimal, rng: &mut StdRng) {
    let step = Decimal::new(rng.random_range(-100..=100), 2);
    *price = (*price + step).max(price_floor());
}
