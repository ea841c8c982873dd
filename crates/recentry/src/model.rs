//! Modeled probability of a YES settlement, used against the
//! market-implied probability to produce AutoEntryEngine's `differential`
//! (glossary: "the spread between a modeled probability and the
//! market-implied probability").
//!
//! The model treats the underlying's price at close as normally
//! distributed around the current spot, with a standard deviation derived
//! from a rolling realized-volatility estimate ([`crate::volatility`])
//! scaled by remaining time-to-close — the same
//! scale-by-sqrt-of-time convention `hip3-detector::config`'s
//! `velocity_multiplier`/session-sizing knobs use for time-scaled
//! adjustments, applied here to an actual distribution rather than a
//! linear multiplier.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use statrs::distribution::{ContinuousCDF, Normal};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Modeled probability (0-100) that the underlying settles at or above
/// `strike` at close, given `spot`, `ttc_seconds` remaining, and a daily
/// realized-volatility estimate (as a fraction, e.g. `0.02` for 2%/day).
///
/// Returns `100` if `ttc_seconds <= 0` and spot is already past strike,
/// `0` if not — at expiry there is no more time for the price to move.
pub fn modeled_probability_yes(
    spot: Decimal,
    strike: Decimal,
    ttc_seconds: i64,
    daily_volatility: Decimal,
) -> Decimal {
    if ttc_seconds <= 0 {
        return if spot >= strike {
            Decimal::from(100)
        } else {
            Decimal::ZERO
        };
    }

    let spot_f = spot.to_f64().unwrap_or(0.0);
    let strike_f = strike.to_f64().unwrap_or(0.0);
    let daily_vol_f = daily_volatility.to_f64().unwrap_or(0.0).max(0.0);

    let sigma = daily_vol_f * spot_f * (ttc_seconds as f64 / SECONDS_PER_DAY).sqrt();
    if sigma <= 0.0 {
        return if spot_f >= strike_f {
            Decimal::from(100)
        } else {
            Decimal::ZERO
        };
    }

    let Ok(normal) = Normal::new(0.0, 1.0) else {
        return Decimal::from(50);
    };
    let z = (spot_f - strike_f) / sigma;
    let prob = normal.cdf(z) * 100.0;

    Decimal::try_from(prob.clamp(0.0, 100.0)).unwrap_or(Decimal::from(50))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_spot_well_above_strike_is_near_certain() {
        let prob = modeled_probability_yes(dec!(110000), dec!(100000), 3600, dec!(0.02));
        assert!(prob > dec!(95));
    }

    #[test]
    fn test_spot_well_below_strike_is_near_zero() {
        let prob = modeled_probability_yes(dec!(90000), dec!(100000), 3600, dec!(0.02));
        assert!(prob < dec!(5));
    }

    #[test]
    fn test_spot_at_strike_is_fifty_fifty() {
        let prob = modeled_probability_yes(dec!(100000), dec!(100000), 3600, dec!(0.02));
        assert!((prob - dec!(50)).abs() < dec!(0.5));
    }

    #[test]
    fn test_zero_time_to_close_is_deterministic() {
        assert_eq!(
            modeled_probability_yes(dec!(101000), dec!(100000), 0, dec!(0.02)),
            dec!(100)
        );
        assert_eq!(
            modeled_probability_yes(dec!(99000), dec!(100000), 0, dec!(0.02)),
            dec!(0)
        );
    }

    #[test]
    fn test_zero_volatility_is_deterministic() {
        assert_eq!(
            modeled_probability_yes(dec!(101000), dec!(100000), 3600, dec!(0)),
            dec!(100)
        );
    }

    #[test]
    fn test_more_time_remaining_widens_the_distribution() {
        // Same spot/strike gap, more time left: less certainty either way.
        let near = modeled_probability_yes(dec!(101000), dec!(100000), 60, dec!(0.02));
        let far = modeled_probability_yes(dec!(101000), dec!(100000), 3600 * 20, dec!(0.02));
        assert!(far < near);
    }
}
