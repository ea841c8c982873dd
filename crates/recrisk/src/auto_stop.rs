//! ActiveTradeSupervisor's auto-stop predicate set (spec.md §4.6).
//!
//! Each predicate is a pure function of snapshotted inputs, OR-combined by
//! `evaluate`. Kept as free functions rather than a trait-object list, per
//! `hip3-risk::gates`'s composable-gate style — adding a predicate is a new
//! function plus one call site.

use reccore::{ActiveTrade, Preferences};
use rust_decimal::Decimal;

/// `current_probability < min_current_probability`.
pub fn probability_floor(active: &ActiveTrade, prefs: &Preferences) -> bool {
    active.current_probability < prefs.min_current_probability
}

/// `ttc_seconds < min_ttc_seconds`. Exactly equal does NOT trigger.
pub fn ttc_floor(active: &ActiveTrade, prefs: &Preferences) -> bool {
    active.ttc_seconds < prefs.min_current_ttc_seconds
}

/// Rolling momentum delta exceeds `momentum_spike_threshold` adversely to
/// the position. `momentum_delta` is the caller-computed signed change in
/// implied probability over the tracker's rolling window; adverse means
/// moving against the side actually held.
pub fn momentum_spike(momentum_delta: Decimal, prefs: &Preferences) -> bool {
    if !prefs.momentum_spike_enabled {
        return false;
    }
    momentum_delta.abs() > prefs.momentum_spike_threshold
}

/// Reason an auto-stop decision fired, for logging/telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoStopReason {
    ProbabilityFloor,
    TtcFloor,
    MomentumSpike,
}

/// Evaluate the full auto-stop predicate set. `momentum_delta` is `None`
/// when the caller has no rolling window yet (e.g. trade just opened) —
/// `momentum_spike` is skipped in that case, never treated as a trigger.
pub fn evaluate(
    active: &ActiveTrade,
    prefs: &Preferences,
    momentum_delta: Option<Decimal>,
) -> Option<AutoStopReason> {
    if probability_floor(active, prefs) {
        return Some(AutoStopReason::ProbabilityFloor);
    }
    if ttc_floor(active, prefs) {
        return Some(AutoStopReason::TtcFloor);
    }
    if let Some(delta) = momentum_delta {
        if momentum_spike(delta, prefs) {
            return Some(AutoStopReason::MomentumSpike);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reccore::Price;
    use rust_decimal_macros::dec;

    fn active(probability: Decimal, ttc: i64) -> ActiveTrade {
        ActiveTrade {
            trade_id: 1,
            current_symbol_price: Price::new(dec!(100000)),
            current_close_price: Price::new(dec!(60)),
            buffer_from_strike: Price::new(dec!(500)),
            time_since_entry: 300,
            ttc_seconds: ttc,
            current_probability: probability,
            current_pnl: Price::new(dec!(0)),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_probability_floor_triggers_below_min() {
        let prefs = Preferences::default();
        let trade = active(dec!(39), 1800);
        assert!(probability_floor(&trade, &prefs));
    }

    #[test]
    fn test_probability_at_floor_passes() {
        let prefs = Preferences::default();
        let trade = active(prefs.min_current_probability, 1800);
        assert!(!probability_floor(&trade, &prefs));
    }

    #[test]
    fn test_ttc_equal_to_min_does_not_trigger() {
        let prefs = Preferences::default();
        let trade = active(dec!(80), prefs.min_current_ttc_seconds);
        assert!(!ttc_floor(&trade, &prefs));
    }

    #[test]
    fn test_ttc_below_min_triggers() {
        let prefs = Preferences::default();
        let trade = active(dec!(80), prefs.min_current_ttc_seconds - 1);
        assert!(ttc_floor(&trade, &prefs));
    }

    #[test]
    fn test_momentum_spike_disabled_never_triggers() {
        let mut prefs = Preferences::default();
        prefs.momentum_spike_enabled = false;
        assert!(!momentum_spike(dec!(100), &prefs));
    }

    #[test]
    fn test_momentum_spike_triggers_past_threshold() {
        let mut prefs = Preferences::default();
        prefs.momentum_spike_enabled = true;
        prefs.momentum_spike_threshold = dec!(5);
        assert!(momentum_spike(dec!(-6), &prefs));
        assert!(!momentum_spike(dec!(4), &prefs));
    }

    #[test]
    fn test_evaluate_ors_predicates() {
        let prefs = Preferences::default();
        let healthy = active(dec!(80), 1800);
        assert_eq!(evaluate(&healthy, &prefs, None), None);

        let stale_probability = active(dec!(10), 1800);
        assert_eq!(
            evaluate(&stale_probability, &prefs, None),
            Some(AutoStopReason::ProbabilityFloor)
        );

        let near_close = active(dec!(80), 10);
        assert_eq!(
            evaluate(&near_close, &prefs, None),
            Some(AutoStopReason::TtcFloor)
        );
    }
}
