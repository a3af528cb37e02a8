//! Ticker symbols and the fixed supported set

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Supported tickers used when no override is configured.
pub const DEFAULT_TICKERS: [&str; 5] = ["GOOG", "TSLA", "AMZN", "META", "NVDA"];

/// Short identifier for a tradable instrument.
///
/// Tickers are opaque strings on the wire; validity is defined by membership
/// in the process-wide [`SupportedTickers`] set, not by shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Create a ticker from a symbol string.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    /// The symbol as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Ticker {
    fn from(symbol: &str) -> Self {
        Self(symbol.to_string())
    }
}

/// The server-defined set of tickers that can be streamed.
///
/// Order-preserving and immutable for the process lifetime. Snapshots are
/// emitted in exactly this order.
#[derive(Debug, Clone)]
pub struct SupportedTickers {
    tickers: Vec<Ticker>,
}

impl SupportedTickers {
    /// Build a supported set, rejecting empty and duplicated input.
    pub fn new(tickers: Vec<Ticker>) -> Result<Self, ConfigError> {
        if tickers.is_empty() {
            return Err(ConfigError::EmptyTickerSet);
        }
        let mut seen = HashSet::new();
        for ticker in &tickers {
            if !seen.insert(ticker.clone()) {
                return Err(ConfigError::DuplicateTicker(ticker.clone()));
            }
        }
        Ok(Self { tickers })
    }

    /// Parse a comma-separated list like `"GOOG,TSLA,AMZN"`.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        let tickers = list
            .split(',')
            .map(str::trim)
            .filter(|symbol| !symbol.is_empty())
            .map(Ticker::from)
            .collect();
        Self::new(tickers)
    }

    /// Whether `ticker` belongs to the supported set.
    pub fn contains(&self, ticker: &Ticker) -> bool {
        self.tickers.contains(ticker)
    }

    /// The tickers in their fixed server order.
    pub fn as_slice(&self) -> &[Ticker] {
        &self.tickers
    }

    /// Number of supported tickers.
    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    /// Always false: construction rejects empty sets.
    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

impl Default for SupportedTickers {
    fn default() -> Self {
        Self {
            tickers: DEFAULT_TICKERS.iter().copied().map(Ticker::from).collect(),
        }
    }
}
