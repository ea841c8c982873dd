//! Subscription management for Kalshi's `ticker_v2` channel.
//!
//! Tracks which market tickers are subscribed and which have received
//! their initial snapshot, so MarketFeed can tell "connected" apart from
//! "ready to serve quotes".

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Per-market ready state tracking.
#[derive(Debug, Clone, Default)]
pub struct MarketReadyState {
    pub first_recv: Option<DateTime<Utc>>,
    pub last_recv: Option<DateTime<Utc>>,
    pub excluded: bool,
    pub exclusion_reason: Option<String>,
}

impl MarketReadyState {
    pub fn is_ready(&self) -> bool {
        !self.excluded && self.first_recv.is_some()
    }

    pub fn age_ms(&self) -> Option<i64> {
        self.last_recv.map(|t| (Utc::now() - t).num_milliseconds())
    }
}

/// Ready state for the single `ticker_v2` channel, aggregated over every
/// subscribed market ticker.
#[derive(Debug, Clone, Default)]
pub struct ReadyState {
    pub ticker_v2_ready: bool,
}

impl ReadyState {
    pub fn is_ready(&self) -> bool {
        self.ticker_v2_ready
    }
}

#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    /// Timeout for initial snapshot reception per market.
    pub initial_timeout: Duration,
    /// Maximum quote age before a market is considered stale.
    pub max_data_age: Duration,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            initial_timeout: Duration::from_secs(10),
            max_data_age: Duration::from_secs(10),
        }
    }
}

/// Tracks `ticker_v2` subscriptions and per-market first/last-seen state.
pub struct SubscriptionManager {
    config: SubscriptionConfig,
    subscriptions: Arc<RwLock<HashSet<String>>>,
    ready_state: Arc<RwLock<ReadyState>>,
    market_states: Arc<RwLock<HashMap<String, MarketReadyState>>>,
    start_time: DateTime<Utc>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::with_config(SubscriptionConfig::default())
    }

    pub fn with_config(config: SubscriptionConfig) -> Self {
        Self {
            config,
            subscriptions: Arc::new(RwLock::new(HashSet::new())),
            ready_state: Arc::new(RwLock::new(ReadyState::default())),
            market_states: Arc::new(RwLock::new(HashMap::new())),
            start_time: Utc::now(),
        }
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.ready_state.read().is_ready()
    }

    pub fn market_state(&self, ticker: &str) -> Option<MarketReadyState> {
        self.market_states.read().get(ticker).cloned()
    }

    pub fn all_market_states(&self) -> HashMap<String, MarketReadyState> {
        self.market_states.read().clone()
    }

    pub fn ready_markets(&self) -> Vec<String> {
        self.market_states
            .read()
            .iter()
            .filter(|(_, state)| state.is_ready())
            .map(|(ticker, _)| ticker.clone())
            .collect()
    }

    pub fn add_subscription(&self, channel: String) {
        self.subscriptions.write().insert(channel);
    }

    pub fn remove_subscription(&self, channel: &str) {
        self.subscriptions.write().remove(channel);
    }

    /// Record a `ticker_v2` delta for `ticker`; once every subscribed
    /// ticker has received at least one delta, the channel is ready.
    pub fn handle_ticker_v2(&self, ticker: &str) {
        let now = Utc::now();
        {
            let mut states = self.market_states.write();
            let state = states.entry(ticker.to_string()).or_default();
            if state.first_recv.is_none() {
                state.first_recv = Some(now);
                debug!(ticker, "first ticker_v2 delta received");
            }
            state.last_recv = Some(now);
        }

        let all_ready = {
            let subs = self.subscriptions.read();
            let states = self.market_states.read();
            !subs.is_empty()
                && subs
                    .iter()
                    .all(|s| states.get(s).is_some_and(MarketReadyState::is_ready))
        };
        self.ready_state.write().ticker_v2_ready = all_ready;
    }

    /// Mark a market excluded (e.g. it never produced an initial snapshot
    /// within `initial_timeout`), so it is dropped from the ready set.
    pub fn exclude_market(&self, ticker: &str, reason: impl Into<String>) {
        let mut states = self.market_states.write();
        let state = states.entry(ticker.to_string()).or_default();
        state.excluded = true;
        state.exclusion_reason = Some(reason.into());
    }

    pub fn reset_ready_state(&self) {
        *self.ready_state.write() = ReadyState::default();
        self.market_states.write().clear();
    }

    pub fn initial_timeout_elapsed(&self) -> bool {
        (Utc::now() - self.start_time).to_std().unwrap_or_default() > self.config.initial_timeout
    }

    pub fn max_data_age(&self) -> Duration {
        self.config.max_data_age
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_market_becomes_ready_after_first_delta() {
        let mgr = SubscriptionManager::new();
        mgr.add_subscription("BTC-TICKER".to_string());
        assert!(!mgr.is_ready());
        mgr.handle_ticker_v2("BTC-TICKER");
        assert!(mgr.is_ready());
    }

    #[test]
    fn test_not_ready_until_every_subscribed_market_reports() {
        let mgr = SubscriptionManager::new();
        mgr.add_subscription("BTC-TICKER".to_string());
        mgr.add_subscription("ETH-TICKER".to_string());
        mgr.handle_ticker_v2("BTC-TICKER");
        assert!(!mgr.is_ready());
        mgr.handle_ticker_v2("ETH-TICKER");
        assert!(mgr.is_ready());
    }

    #[test]
    fn test_excluded_market_never_counts_ready() {
        let mgr = SubscriptionManager::new();
        mgr.add_subscription("BTC-TICKER".to_string());
        mgr.handle_ticker_v2("BTC-TICKER");
        mgr.exclude_market("BTC-TICKER", "timed out");
        assert!(!mgr.market_state("BTC-TICKER").unwrap().is_ready());
    }
}
