//! AutoEntryEngine's entry predicate set (spec.md §4.7).
//!
//! Each gate is a pure function over a scalar already computed by the
//! caller (AutoEntryEngine owns the modeled-probability/differential
//! math against a market snapshot); `recrisk` only holds the comparison
//! against preferences, mirroring [`crate::auto_stop`]'s shape and
//! `hip3-detector::detector::DislocationDetector`'s config-driven
//! predicate evaluation.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reccore::Preferences;
use rust_decimal::Decimal;

/// `current_probability >= min_probability`.
pub fn probability_gate(current_probability: Decimal, prefs: &Preferences) -> bool {
    current_probability >= prefs.min_probability
}

/// `differential >= min_differential`.
pub fn differential_gate(differential: Decimal, prefs: &Preferences) -> bool {
    differential >= prefs.min_differential
}

/// `min_time <= time_since_window_open <= max_time`.
pub fn time_window_gate(time_since_window_open: i64, prefs: &Preferences) -> bool {
    time_since_window_open >= prefs.min_time_seconds && time_since_window_open <= prefs.max_time_seconds
}

/// `ttc_seconds >= min_ttc_seconds`.
pub fn ttc_gate(ttc_seconds: i64, prefs: &Preferences) -> bool {
    ttc_seconds >= prefs.min_ttc_seconds
}

/// `volume >= watchlist_min_volume && ask <= watchlist_max_ask`.
pub fn watchlist_gate(volume: i64, ask: Decimal, prefs: &Preferences) -> bool {
    volume >= prefs.watchlist_min_volume && ask <= prefs.watchlist_max_ask
}

/// Re-entry guard: `true` means entry is allowed. If re-entry is
/// disallowed, any market with an existing terminal trade today is
/// skipped.
pub fn re_entry_guard(has_terminal_trade_today: bool, prefs: &Preferences) -> bool {
    prefs.allow_re_entry || !has_terminal_trade_today
}

/// Reason an entry candidate was rejected, for logging/telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRejectReason {
    Probability,
    Differential,
    TimeWindow,
    Ttc,
    Watchlist,
    ReEntry,
    SpikeCooldown,
}

/// Evaluate every scalar entry gate except the spike cooldown (which is
/// stateful and tracked separately via [`SpikeCooldownTracker`]).
#[allow(clippy::too_many_arguments)]
pub fn evaluate_scalar_gates(
    current_probability: Decimal,
    differential: Decimal,
    time_since_window_open: i64,
    ttc_seconds: i64,
    volume: i64,
    ask: Decimal,
    has_terminal_trade_today: bool,
    prefs: &Preferences,
) -> Result<(), EntryRejectReason> {
    if !probability_gate(current_probability, prefs) {
        return Err(EntryRejectReason::Probability);
    }
    if !differential_gate(differential, prefs) {
        return Err(EntryRejectReason::Differential);
    }
    if !time_window_gate(time_since_window_open, prefs) {
        return Err(EntryRejectReason::TimeWindow);
    }
    if !ttc_gate(ttc_seconds, prefs) {
        return Err(EntryRejectReason::Ttc);
    }
    if !watchlist_gate(volume, ask, prefs) {
        return Err(EntryRejectReason::Watchlist);
    }
    if !re_entry_guard(has_terminal_trade_today, prefs) {
        return Err(EntryRejectReason::ReEntry);
    }
    Ok(())
}

/// Per-market spike-then-cooldown state, grounded on
/// `hip3-detector::cross_tracker`'s spike/cooldown state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpikeState {
    /// No recent spike.
    Normal,
    /// Momentum exceeded `spike_alert_momentum_threshold`; waiting for it
    /// to fall back below `spike_alert_cooldown_threshold`.
    Spiked,
    /// Momentum has settled; entries suppressed until `until`.
    Cooldown { until: Instant },
}

/// Tracks, per market ticker, whether new entries should be suppressed
/// following a momentum spike.
pub struct SpikeCooldownTracker {
    states: HashMap<String, SpikeState>,
}

impl SpikeCooldownTracker {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }

    /// Feed the latest momentum reading for `ticker`. Returns `true` if
    /// new entries into this market are currently suppressed.
    pub fn observe(&mut self, ticker: &str, momentum: Decimal, prefs: &Preferences) -> bool {
        let state = self
            .states
            .entry(ticker.to_string())
            .or_insert(SpikeState::Normal);

        *state = match *state {
            SpikeState::Normal => {
                if momentum.abs() > prefs.spike_alert_momentum_threshold {
                    SpikeState::Spiked
                } else {
                    SpikeState::Normal
                }
            }
            SpikeState::Spiked => {
                if momentum.abs() < prefs.spike_alert_cooldown_threshold {
                    SpikeState::Cooldown {
                        until: Instant::now()
                            + Duration::from_secs(
                                prefs.spike_alert_cooldown_minutes.max(0) as u64 * 60,
                            ),
                    }
                } else {
                    SpikeState::Spiked
                }
            }
            SpikeState::Cooldown { until } => {
                if Instant::now() >= until {
                    SpikeState::Normal
                } else {
                    SpikeState::Cooldown { until }
                }
            }
        };

        matches!(*state, SpikeState::Spiked | SpikeState::Cooldown { .. })
    }

    /// Drop tracked state for a ticker (e.g. once it leaves the watchlist).
    pub fn remove(&mut self, ticker: &str) {
        self.states.remove(ticker);
    }
}

impl Default for SpikeCooldownTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_probability_gate_at_exactly_min_passes() {
        let mut prefs = Preferences::default();
        prefs.min_probability = dec!(95);
        assert!(probability_gate(dec!(95), &prefs));
        assert!(!probability_gate(dec!(94.9), &prefs));
    }

    #[test]
    fn test_time_window_gate_bounds_inclusive() {
        let mut prefs = Preferences::default();
        prefs.min_time_seconds = 120;
        prefs.max_time_seconds = 900;
        assert!(time_window_gate(120, &prefs));
        assert!(time_window_gate(900, &prefs));
        assert!(!time_window_gate(119, &prefs));
        assert!(!time_window_gate(901, &prefs));
    }

    #[test]
    fn test_re_entry_guard() {
        let mut prefs = Preferences::default();
        prefs.allow_re_entry = false;
        assert!(!re_entry_guard(true, &prefs));
        assert!(re_entry_guard(false, &prefs));

        prefs.allow_re_entry = true;
        assert!(re_entry_guard(true, &prefs));
    }

    #[test]
    fn test_evaluate_scalar_gates_s1_scenario() {
        let mut prefs = Preferences::default();
        prefs.min_probability = dec!(95);
        prefs.min_differential = dec!(0.25);
        prefs.min_time_seconds = 120;
        prefs.max_time_seconds = 900;
        prefs.allow_re_entry = false;

        let result = evaluate_scalar_gates(
            dec!(96),
            dec!(0.30),
            300,
            1800,
            prefs.watchlist_min_volume,
            prefs.watchlist_max_ask,
            false,
            &prefs,
        );
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn test_spike_cooldown_suppresses_then_releases() {
        let mut prefs = Preferences::default();
        prefs.spike_alert_momentum_threshold = dec!(10);
        prefs.spike_alert_cooldown_threshold = dec!(3);
        prefs.spike_alert_cooldown_minutes = 0;

        let mut tracker = SpikeCooldownTracker::new();
        assert!(!tracker.observe("EVT-A", dec!(1), &prefs));
        assert!(tracker.observe("EVT-A", dec!(15), &prefs));
        // Settles below cooldown threshold -> enters Cooldown, still suppressed.
        assert!(tracker.observe("EVT-A", dec!(1), &prefs));
        // cooldown_minutes=0 means the window has already elapsed by the
        // time we observe again.
        assert!(!tracker.observe("EVT-A", dec!(1), &prefs));
    }
}
