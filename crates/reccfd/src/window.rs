//! Rolling window of recent FATAL events, keyed by service name.
//!
//! Generalizes the per-market rolling outcome window used to auto-disable
//! unhealthy markets: here the tracked "outcome" is a service reaching
//! FATAL, and the "score" crossed is the count of *distinct* services that
//! have gone FATAL within the window, not a single service's own history.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub struct FailureWindowConfig {
    /// How far back a FATAL event still counts toward the cascade tally.
    pub window_seconds: i64,
    /// Number of distinct services FATAL within the window that counts as
    /// a cascading failure.
    pub cascade_threshold: usize,
}

impl Default for FailureWindowConfig {
    fn default() -> Self {
        Self {
            window_seconds: 300,
            cascade_threshold: 3,
        }
    }
}

/// Tracks FATAL timestamps per service and reports whether the current
/// distinct-service tally within the window has crossed the cascade
/// threshold.
pub struct FailureWindowTracker {
    config: FailureWindowConfig,
    events: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl FailureWindowTracker {
    pub fn new(config: FailureWindowConfig) -> Self {
        Self {
            config,
            events: Mutex::new(HashMap::new()),
        }
    }

    /// Record a FATAL event for `service` and return the number of
    /// distinct services with at least one FATAL inside the window.
    pub fn record_fatal(&self, service: &str, now: DateTime<Utc>) -> usize {
        let mut events = self.events.lock();
        let cutoff = now - chrono::Duration::seconds(self.config.window_seconds);

        let history = events.entry(service.to_string()).or_default();
        history.push_back(now);
        while history.front().is_some_and(|ts| *ts < cutoff) {
            history.pop_front();
        }

        for history in events.values_mut() {
            while history.front().is_some_and(|ts| *ts < cutoff) {
                history.pop_front();
            }
        }

        events.values().filter(|h| !h.is_empty()).count()
    }

    /// True if the most recent [`record_fatal`] tally meets or exceeds the
    /// cascade threshold.
    pub fn is_cascading(&self, distinct_count: usize) -> bool {
        distinct_count >= self.config.cascade_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(window_seconds: i64, threshold: usize) -> FailureWindowConfig {
        FailureWindowConfig {
            window_seconds,
            cascade_threshold: threshold,
        }
    }

    #[test]
    fn test_single_service_repeated_fatal_does_not_cascade() {
        let tracker = FailureWindowTracker::new(config(300, 3));
        let now = Utc::now();
        let count = tracker.record_fatal("trade_executor", now);
        let count = tracker.record_fatal("trade_executor", now);
        assert_eq!(count, 1);
        assert!(!tracker.is_cascading(count));
    }

    #[test]
    fn test_three_distinct_services_cascades() {
        let tracker = FailureWindowTracker::new(config(300, 3));
        let now = Utc::now();
        tracker.record_fatal("trade_executor", now);
        tracker.record_fatal("trade_manager", now);
        let count = tracker.record_fatal("active_trade_supervisor", now);
        assert_eq!(count, 3);
        assert!(tracker.is_cascading(count));
    }

    #[test]
    fn test_events_outside_window_are_dropped() {
        let tracker = FailureWindowTracker::new(config(60, 2));
        let t0 = Utc::now();
        tracker.record_fatal("trade_executor", t0);
        let later = t0 + chrono::Duration::seconds(61);
        let count = tracker.record_fatal("trade_manager", later);
        assert_eq!(count, 1);
    }
}
