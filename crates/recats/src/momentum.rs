//! Rolling momentum tracking for the `momentum_spike` auto-stop predicate.
//!
//! `recrisk::auto_stop::momentum_spike` takes the adverse magnitude as a
//! pre-computed scalar and only compares it to a threshold — it has no
//! notion of "adverse to which side" or "over what window". This module
//! owns that modeling: per trade, it keeps a short rolling window of
//! `current_probability` samples and reduces it to the signed delta that
//! is adverse to the side actually held, clamped to zero when the move was
//! favorable so a large favorable swing can never be mistaken for a spike.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use reccore::TradeSide;
use rust_decimal::Decimal;

/// How far back probability samples are kept for the delta calculation.
pub const MOMENTUM_WINDOW_SECONDS: i64 = 30;

struct Window {
    samples: VecDeque<(DateTime<Utc>, Decimal)>,
}

/// Per-trade rolling probability history, keyed by `trade_id`.
pub struct MomentumTracker {
    windows: HashMap<u64, Window>,
}

impl MomentumTracker {
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
        }
    }

    /// Record this tick's probability for `trade_id` and return the adverse
    /// delta over the rolling window, if the window has at least two samples.
    pub fn record(
        &mut self,
        trade_id: u64,
        side: TradeSide,
        probability: Decimal,
        now: DateTime<Utc>,
    ) -> Option<Decimal> {
        let window = self.windows.entry(trade_id).or_insert_with(|| Window {
            samples: VecDeque::new(),
        });

        window.samples.push_back((now, probability));
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
        let raw_delta = probability - oldest;

        // Adverse for YES is a probability drop; adverse for NO is a rise.
        let adverse = match side {
            TradeSide::Yes => -raw_delta,
            TradeSide::No => raw_delta,
        };
        Some(adverse.max(Decimal::ZERO))
    }

    /// Drop history for a trade once it leaves the non-terminal set.
    pub fn remove(&mut self, trade_id: u64) {
        self.windows.remove(&trade_id);
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
        let now = Utc::now();
        assert_eq!(tracker.record(1, TradeSide::Yes, dec!(80), now), None);
    }

    #[test]
    fn test_probability_drop_is_adverse_for_yes() {
        let mut tracker = MomentumTracker::new();
        let t0 = Utc::now();
        tracker.record(1, TradeSide::Yes, dec!(80), t0);
        let delta = tracker
            .record(1, TradeSide::Yes, dec!(65), t0 + chrono::Duration::seconds(5))
            .unwrap();
        assert_eq!(delta, dec!(15));
    }

    #[test]
    fn test_probability_rise_is_favorable_for_yes_clamped_to_zero() {
        let mut tracker = MomentumTracker::new();
        let t0 = Utc::now();
        tracker.record(1, TradeSide::Yes, dec!(80), t0);
        let delta = tracker
            .record(1, TradeSide::Yes, dec!(90), t0 + chrono::Duration::seconds(5))
            .unwrap();
        assert_eq!(delta, dec!(0));
    }

    #[test]
    fn test_probability_rise_is_adverse_for_no() {
        let mut tracker = MomentumTracker::new();
        let t0 = Utc::now();
        tracker.record(1, TradeSide::No, dec!(20), t0);
        let delta = tracker
            .record(1, TradeSide::No, dec!(35), t0 + chrono::Duration::seconds(5))
            .unwrap();
        assert_eq!(delta, dec!(15));
    }

    #[test]
    fn test_samples_outside_window_are_pruned() {
        let mut tracker = MomentumTracker::new();
        let t0 = Utc::now();
        tracker.record(1, TradeSide::Yes, dec!(80), t0);
        let delta = tracker.record(
            1,
            TradeSide::Yes,
            dec!(50),
            t0 + chrono::Duration::seconds(MOMENTUM_WINDOW_SECONDS + 10),
        );
        // The t0 sample was pruned, leaving only the new one: no delta yet.
        assert_eq!(delta, None);
    }

    #[test]
    fn test_remove_clears_history() {
        let mut tracker = MomentumTracker::new();
        tracker.record(1, TradeSide::Yes, dec!(80), Utc::now());
        tracker.remove(1);
        assert!(tracker.windows.is_empty());
    }
}
