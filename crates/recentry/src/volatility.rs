//! Rolling realized-volatility estimate per underlying symbol, feeding
//! [`crate::model::modeled_probability_yes`].
//!
//! Grounded on `recats::momentum::MomentumTracker`'s windowed-sample shape:
//! a bounded deque of timestamped observations, pruned to a fixed lookback
//! on each record. Volatility is computed from log returns between
//! consecutive samples rather than a stats-crate convenience function,
//! matching how the teacher's own detector config computed its EWMA
//! fields directly in `config.rs` rather than importing a rolling-stats
//! helper for arithmetic this simple.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// How far back price samples are kept for the volatility estimate.
pub const VOLATILITY_WINDOW_SECONDS: i64 = 300;

/// Daily volatility used until a symbol has accumulated enough samples to
/// estimate its own — a conservative default for a liquid crypto spot.
pub const DEFAULT_DAILY_VOLATILITY: &str = "0.02";

/// Minimum samples in the window before a realized estimate is trusted.
const MIN_SAMPLES: usize = 10;

struct Window {
    samples: VecDeque<(DateTime<Utc>, f64)>,
}

/// Per-symbol rolling realized-volatility tracker.
pub struct VolatilityTracker {
    windows: HashMap<String, Window>,
    default_daily_volatility: Decimal,
}

impl VolatilityTracker {
    pub fn new() -> Self {
        Self {
            windows: HashMap::new(),
            default_daily_volatility: DEFAULT_DAILY_VOLATILITY
                .parse()
                .expect("valid default volatility literal"),
        }
    }

    /// Record the latest spot price for `symbol`.
    pub fn record(&mut self, symbol: &str, price: Decimal, now: DateTime<Utc>) {
        let Some(price_f) = price.to_f64() else {
            return;
        };
        if price_f <= 0.0 {
            return;
        }

        let window = self
            .windows
            .entry(symbol.to_string())
            .or_insert_with(|| Window {
                samples: VecDeque::new(),
            });

        window.samples.push_back((now, price_f));
        let cutoff = now - chrono::Duration::seconds(VOLATILITY_WINDOW_SECONDS);
        while window
            .samples
            .front()
            .is_some_and(|(ts, _)| *ts < cutoff)
        {
            window.samples.pop_front();
        }
    }

    /// Daily volatility estimate for `symbol`, as a fraction (`0.02` = 2%
    /// per day). Falls back to [`DEFAULT_DAILY_VOLATILITY`] until the
    /// window holds at least [`MIN_SAMPLES`] observations.
    pub fn daily_volatility(&self, symbol: &str) -> Decimal {
        let Some(window) = self.windows.get(symbol) else {
            return self.default_daily_volatility;
        };
        if window.samples.len() < MIN_SAMPLES {
            return self.default_daily_volatility;
        }

        let mut log_returns = Vec::with_capacity(window.samples.len() - 1);
        let mut prev: Option<f64> = None;
        for (_, price) in &window.samples {
            if let Some(p) = prev {
                if p > 0.0 && *price > 0.0 {
                    log_returns.push((price / p).ln());
                }
            }
            prev = Some(*price);
        }
        if log_returns.len() < 2 {
            return self.default_daily_volatility;
        }

        let mean = log_returns.iter().sum::<f64>() / log_returns.len() as f64;
        let variance = log_returns
            .iter()
            .map(|r| (r - mean).powi(2))
            .sum::<f64>()
            / (log_returns.len() - 1) as f64;
        let per_sample_std = variance.sqrt();

        let span_seconds = (window.samples.back().unwrap().0 - window.samples.front().unwrap().0)
            .num_seconds()
            .max(1) as f64;
        let samples_per_day = SECONDS_PER_DAY / (span_seconds / log_returns.len() as f64);
        let daily_std = per_sample_std * samples_per_day.sqrt();

        Decimal::try_from(daily_std.clamp(0.001, 1.0)).unwrap_or(self.default_daily_volatility)
    }

    /// Drop tracked state for a symbol no longer being watched.
    pub fn remove(&mut self, symbol: &str) {
        self.windows.remove(symbol);
    }
}

const SECONDS_PER_DAY: f64 = 86_400.0;

impl Default for VolatilityTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_falls_back_to_default_with_no_samples() {
        let tracker = VolatilityTracker::new();
        assert_eq!(
            tracker.daily_volatility("BTC"),
            dec!(0.02)
        );
    }

    #[test]
    fn test_falls_back_to_default_below_min_samples() {
        let mut tracker = VolatilityTracker::new();
        let t0 = Utc::now();
        for i in 0..5 {
            tracker.record("BTC", Decimal::from(100_000 + i), t0 + chrono::Duration::seconds(i));
        }
        assert_eq!(tracker.daily_volatility("BTC"), dec!(0.02));
    }

    #[test]
    fn test_flat_price_series_yields_near_zero_volatility() {
        let mut tracker = VolatilityTracker::new();
        let t0 = Utc::now();
        for i in 0..20 {
            tracker.record("BTC", dec!(100000), t0 + chrono::Duration::seconds(i * 10));
        }
        let vol = tracker.daily_volatility("BTC");
        assert!(vol <= dec!(0.01), "expected near-floor volatility, got {vol}");
    }

    #[test]
    fn test_samples_outside_window_are_pruned() {
        let mut tracker = VolatilityTracker::new();
        let t0 = Utc::now();
        for i in 0..20 {
            tracker.record("BTC", dec!(100000), t0 + chrono::Duration::seconds(i * 10));
        }
        // Jump far past the window: history should reset, falling back to default.
        tracker.record(
            "BTC",
            dec!(100000),
            t0 + chrono::Duration::seconds(VOLATILITY_WINDOW_SECONDS * 3),
        );
        assert_eq!(tracker.daily_volatility("BTC"), dec!(0.02));
    }

    #[test]
    fn test_remove_clears_history() {
        let mut tracker = VolatilityTracker::new();
        tracker.record("BTC", dec!(100000), Utc::now());
        tracker.remove("BTC");
        assert!(tracker.windows.is_empty());
    }
}
