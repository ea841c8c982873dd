//! AutoEntryEngine configuration.
//!
//! Every threshold AutoEntryEngine gates on (`min_probability`,
//! `min_differential`, ...) lives on `reccore::Preferences`, fetched fresh
//! from the store each tick — this struct only holds what is not
//! per-user-tunable: cadence and the markets actually under watch.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_tick_interval_secs() -> u64 {
    2
}

/// One event market under watch, paired with the underlying symbol its
/// spot price should be read from (MarketSnapshot carries only the
/// exchange ticker, not the underlying).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchedMarket {
    pub ticker: String,
    pub symbol: String,
}

impl WatchedMarket {
    pub fn new(ticker: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            symbol: symbol.into(),
        }
    }
}

/// Configuration for one user's AutoEntryEngine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub user: String,
    pub watchlist: Vec<WatchedMarket>,
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
}

impl EngineConfig {
    pub fn new(user: impl Into<String>, watchlist: Vec<WatchedMarket>) -> Self {
        Self {
            user: user.into(),
            watchlist,
            tick_interval_secs: default_tick_interval_secs(),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tick_interval_is_two_seconds() {
        let config = EngineConfig::new("alice", vec![WatchedMarket::new("KXBTCD-TEST", "BTC")]);
        assert_eq!(config.tick_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_tick_interval_floor_is_one_second() {
        let mut config = EngineConfig::new("alice", vec![]);
        config.tick_interval_secs = 0;
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
    }
}
