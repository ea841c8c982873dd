//! US/Eastern timestamp helpers.
//!
//! The system's canonical timezone is US/Eastern: price log timestamps,
//! the 30-day rolling window, and all persisted ISO-8601 strings use it.
//! Rather than carry a timezone database dependency for a single fixed
//! offset, EST (UTC-5) is used directly — DST handling is a known
//! simplification (see DESIGN.md).

use chrono::{DateTime, Duration, Utc};

/// Fixed EST offset from UTC, in hours.
const EST_OFFSET_HOURS: i64 = -5;

/// Rolling window retained by price logs and historical tables.
pub const ROLLING_WINDOW_DAYS: i64 = 30;

/// Current time, truncated to second precision (matches the store's
/// timestamp-PK granularity).
#[must_use]
pub fn now_rounded_to_second() -> DateTime<Utc> {
    round_to_second(Utc::now())
}

/// Truncate a timestamp to second precision.
#[must_use]
pub fn round_to_second(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt - Duration::nanoseconds(dt.timestamp_subsec_nanos() as i64)
}

/// Render a timestamp as an EST-offset ISO-8601 string with second
/// precision, the canonical persisted form per the data model.
#[must_use]
pub fn to_est_iso8601(dt: DateTime<Utc>) -> String {
    let est = dt + Duration::hours(EST_OFFSET_HOURS);
    est.format("%Y-%m-%dT%H:%M:%S-05:00").to_string()
}

/// The cutoff below which a price-log row is expired: `now - 30 days`.
#[must_use]
pub fn rolling_window_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(ROLLING_WINDOW_DAYS)
}

/// True if `timestamp` falls outside the 30-day rolling window as of `now`.
#[must_use]
pub fn is_expired(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    timestamp < rolling_window_cutoff(now)
}

/// Midnight EST for the trading day containing `now`, expressed in UTC —
/// the boundary AutoEntryEngine's re-entry guard uses for "today".
#[must_use]
pub fn start_of_est_day(now: DateTime<Utc>) -> DateTime<Utc> {
    let est = now + Duration::hours(EST_OFFSET_HOURS);
    let midnight_est = est
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time");
    (midnight_est - Duration::hours(EST_OFFSET_HOURS)).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_round_to_second_drops_subsecond() {
        let dt = Utc.with_ymd_and_hms(2026, 2, 7, 12, 0, 30).unwrap()
            + Duration::milliseconds(456);
        let rounded = round_to_second(dt);
        assert_eq!(rounded.timestamp_subsec_nanos(), 0);
        assert_eq!(rounded.timestamp(), dt.timestamp());
    }

    #[test]
    fn test_rolling_window_cutoff_is_30_days_back() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let cutoff = rolling_window_cutoff(now);
        assert_eq!((now - cutoff).num_days(), 30);
    }

    #[test]
    fn test_is_expired_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let exactly_30_days_ago = now - Duration::days(30);
        let just_over = exactly_30_days_ago - Duration::seconds(1);

        assert!(!is_expired(exactly_30_days_ago, now));
        assert!(is_expired(just_over, now));
    }

    #[test]
    fn test_start_of_est_day_before_midnight_utc() {
        // 02:00 UTC on Jul 31 is still Jul 30 in EST (21:00 the prior day).
        let now = Utc.with_ymd_and_hms(2026, 7, 31, 2, 0, 0).unwrap();
        let start = start_of_est_day(now);
        assert_eq!(to_est_iso8601(start), "2026-07-30T00:00:00-05:00");
    }

    #[test]
    fn test_start_of_est_day_is_idempotent_through_the_day() {
        let morning = Utc.with_ymd_and_hms(2026, 7, 30, 13, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2026, 7, 30, 23, 0, 0).unwrap();
        assert_eq!(start_of_est_day(morning), start_of_est_day(evening));
    }

    #[test]
    fn test_to_est_iso8601_format() {
        let dt = Utc.with_ymd_and_hms(2026, 7, 30, 17, 0, 0).unwrap();
        let s = to_est_iso8601(dt);
        assert_eq!(s, "2026-07-30T12:00:00-05:00");
    }
}
