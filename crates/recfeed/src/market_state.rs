//! In-memory market snapshot cache.
//!
//! MarketFeed owns the only authoritative copy of each event market's
//! snapshot; ATS and AutoEntryEngine read it through a cloned [`MarketState`]
//! handle rather than round-tripping through the relational store, since a
//! snapshot is read-mostly and overwritten wholesale on every update.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use reccore::market::{EventTicker, MarketSnapshot};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

struct Entry {
    snapshot: MarketSnapshot,
    received_mono: std::time::Instant,
}

/// Aggregated, per-ticker market snapshot cache shared by every reader of
/// MarketFeed's output.
#[derive(Clone)]
pub struct MarketState {
    markets: Arc<DashMap<EventTicker, RwLock<Entry>>>,
    /// Millisecond unix timestamp of the last successful frame, across all
    /// markets — the heartbeat ATS/AutoEntryEngine stale-check against.
    last_heartbeat_ms: Arc<AtomicI64>,
}

impl MarketState {
    pub fn new() -> Self {
        Self {
            markets: Arc::new(DashMap::new()),
            last_heartbeat_ms: Arc::new(AtomicI64::new(0)),
        }
    }

    /// Apply a full or delta-merged snapshot. Returns `true` if any field
    /// changed relative to what was cached (callers use this to decide
    /// whether to flush to a file sink).
    pub fn update(&self, snapshot: MarketSnapshot) -> bool {
        let changed = match self.markets.get(&snapshot.ticker) {
            Some(existing) => existing.read().snapshot != snapshot,
            None => true,
        };

        self.markets.insert(
            snapshot.ticker.clone(),
            RwLock::new(Entry {
                snapshot,
                received_mono: std::time::Instant::now(),
            }),
        );
        self.record_heartbeat();
        changed
    }

    pub fn get(&self, ticker: &EventTicker) -> Option<MarketSnapshot> {
        self.markets.get(ticker).map(|e| e.read().snapshot.clone())
    }

    pub fn all_snapshots(&self) -> Vec<MarketSnapshot> {
        self.markets.iter().map(|e| e.read().snapshot.clone()).collect()
    }

    pub fn tickers(&self) -> Vec<EventTicker> {
        self.markets.iter().map(|e| e.key().clone()).collect()
    }

    fn record_heartbeat(&self) {
        self.last_heartbeat_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    /// Age of the most recent successful frame, across every market. `None`
    /// if no frame has ever been received.
    pub fn heartbeat_age_ms(&self, now: DateTime<Utc>) -> Option<i64> {
        let last = self.last_heartbeat_ms.load(Ordering::Relaxed);
        if last == 0 {
            None
        } else {
            Some(now.timestamp_millis() - last)
        }
    }

    /// True once the feed has gone stale per spec.md's 10s threshold.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold_ms: i64) -> bool {
        match self.heartbeat_age_ms(now) {
            Some(age) => age > threshold_ms,
            None => true,
        }
    }
}

impl Default for MarketState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use reccore::market::MarketStatus;
    use reccore::{Price, Size};
    use rust_decimal_macros::dec;

    fn sample(ticker: &str) -> MarketSnapshot {
        MarketSnapshot {
            ticker: EventTicker::new(ticker),
            strike: Price::new(dec!(107250)),
            yes_bid: Price::new(dec!(60)),
            yes_ask: Price::new(dec!(62)),
            no_bid: Price::new(dec!(38)),
            no_ask: Price::new(dec!(40)),
            yes_volume: Size::ZERO,
            no_volume: Size::ZERO,
            status: MarketStatus::Open,
            tier_spacing: Price::new(dec!(250)),
            close_time: Utc::now() + Duration::seconds(1800),
            open_time: Utc::now() - Duration::seconds(300),
            received_at: Utc::now(),
        }
    }

    #[test]
    fn test_first_update_is_a_change() {
        let state = MarketState::new();
        assert!(state.update(sample("KXBTCD-TEST")));
    }

    #[test]
    fn test_identical_update_is_not_a_change() {
        let state = MarketState::new();
        let snap = sample("KXBTCD-TEST");
        state.update(snap.clone());
        assert!(!state.update(snap));
    }

    #[test]
    fn test_heartbeat_absent_until_first_frame() {
        let state = MarketState::new();
        assert!(state.heartbeat_age_ms(Utc::now()).is_none());
        assert!(state.is_stale(Utc::now(), 10_000));
    }

    #[test]
    fn test_heartbeat_fresh_after_update() {
        let state = MarketState::new();
        state.update(sample("KXBTCD-TEST"));
        assert!(!state.is_stale(Utc::now(), 10_000));
    }
}
