//! Rolling, symbol-keyed momentum for AutoEntryEngine.
//!
//! Unlike `recats::momentum::MomentumTracker` — which is keyed by
//! `trade_id` and clamps to the delta adverse to a side already held —
//! this tracker has no trade or side yet: it reports the raw signed
//! short-window derivative of the underlying's spot price, which feeds
//! both the entry intent's `momentum` field and
//! `recrisk::auto_entry::SpikeCooldownTracker`'s spike detection.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// How far back spot samples are kept for the momentum calculation.
pub const MOMENTUM_WINDOW_SECONDS: i64 = 30;

struct Window {
    samples: VecDeque<(DateTime<Utc>, Decimal)>,
}

/// Per-symbol rolling spot-price history.
pub struct MomentumTracker {
    windows: HashMap<String, Window>,
}

impl MomentumTracker {
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
        }
    }

    /// Record this tick's spot price for `symbol` and return the signed
    /// delta over the rolling window, if it holds at least two samples.
    pub fn record(&mut self, symbol: &str, price: Decimal, now: DateTime<Utc>) -> Option<Decimal> {
        let window = self
            .windows
            .entry(symbol.to_string())
            .or_insert_with(|| Window {
                samples: VecDeque::new(),
            });

        window.samples.push_back((now, price));
        let cutoff = now - chrono::Duration::seconds(MOMENTUM_WINDOW_SECONDS);
        while window
            .samples
            .front()
            .is_some_and(|(ts, _)| *ts < cutoff)
        {
            window.samples.pop_front();
        }

        let (_, oldest) = window.samples.front()?;
        if window.samples.len() < 2 {
            return None;
        }
        Some(price - oldest)
    }

    /// Drop history for a symbol no longer under watch.
    pub fn remove(&mut self, symbol: &str) {
        self.windows.remove(symbol);
    }
}

impl Default for MomentumTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_single_sample_returns_none() {
        let mut tracker = MomentumTracker::new();
        assert_eq!(tracker.record("BTC", dec!(100000), Utc::now()), None);
    }

    #[test]
    fn test_rising_price_is_positive_momentum() {
        let mut tracker = MomentumTracker::new();
        let t0 = Utc::now();
        tracker.record("BTC", dec!(100000), t0);
        let delta = tracker
            .record("BTC", dec!(100500), t0 + chrono::Duration::seconds(5))
            .unwrap();
        assert_eq!(delta, dec!(500));
    }

    #[test]
    fn test_falling_price_is_negative_momentum() {
        let mut tracker = MomentumTracker::new();
        let t0 = Utc::now();
        tracker.record("BTC", dec!(100000), t0);
        let delta = tracker
            .record("BTC", dec!(99500), t0 + chrono::Duration::seconds(5))
            .unwrap();
        assert_eq!(delta, dec!(-500));
    }

    #[test]
    fn test_samples_outside_window_are_pruned() {
        let mut tracker = MomentumTracker::new();
        let t0 = Utc::now();
        tracker.record("BTC", dec!(100000), t0);
        let delta = tracker.record(
            "BTC",
            dec!(99000),
            t0 + chrono::Duration::seconds(MOMENTUM_WINDOW_SECONDS + 10),
        );
        assert_eq!(delta, None);
    }

    #[test]
    fn test_remove_clears_history() {
        let mut tracker = MomentumTracker::new();
        tracker.record("BTC", dec!(100000), Utc::now());
        tracker.remove("BTC");
        assert!(tracker.windows.is_empty());
    }
}
