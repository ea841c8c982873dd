//! Restart-count bookkeeping for the per-service restart policy.

use chrono::{DateTime, Utc};

/// Window after which a consistently-running service resets its restart
/// counter, per the Supervisor contract's stability window.
pub const STABILITY_WINDOW_SECONDS: i64 = 60;

/// Tracks a service's restart attempts within its current failure window
/// and whether it has been RUNNING long enough to be considered stable.
#[derive(Debug, Clone, Copy)]
pub struct RestartTracker {
    pub restart_count: u32,
    running_since: Option<DateTime<Utc>>,
}

impl Default for RestartTracker {
    fn default() -> Self {
        Self {
            restart_count: 0,
            running_since: None,
        }
    }
}

impl RestartTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the service just reached RUNNING.
    pub fn mark_running(&mut self, now: DateTime<Utc>) {
        self.running_since = Some(now);
    }

    /// Record an unclean exit; returns the restart count after incrementing.
    /// If the service had been running past the stability window, the
    /// counter is reset to 1 instead of incrementing further.
    pub fn record_exit(&mut self, now: DateTime<Utc>) -> u32 {
        let was_stable = self
            .running_since
            .map(|since| (now - since).num_seconds() >= STABILITY_WINDOW_SECONDS)
            .unwrap_or(false);

        self.restart_count = if was_stable { 1 } else { self.restart_count + 1 };
        self.running_since = None;
        self.restart_count
    }

    /// True if `restart_count` has exceeded `startretries`, meaning the
    /// next attempt should not happen — the service goes FATAL instead.
    pub fn exhausted(&self, startretries: u32) -> bool {
        self.restart_count > startretries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fourth_crash_within_window_is_exhausted() {
        let mut tracker = RestartTracker::new();
        let t0 = Utc::now();
        for _ in 0..4 {
            tracker.record_exit(t0);
        }
        assert_eq!(tracker.restart_count, 4);
        assert!(tracker.exhausted(3));
    }

    #[test]
    fn test_third_crash_within_window_not_exhausted() {
        let mut tracker = RestartTracker::new();
        let t0 = Utc::now();
        for _ in 0..3 {
            tracker.record_exit(t0);
        }
        assert!(!tracker.exhausted(3));
    }

    #[test]
    fn test_stability_window_resets_counter() {
        let mut tracker = RestartTracker::new();
        let t0 = Utc::now();
        tracker.record_exit(t0);
        tracker.record_exit(t0);
        tracker.record_exit(t0);
        assert_eq!(tracker.restart_count, 3);

        tracker.mark_running(t0);
        let past_window = t0 + Duration::seconds(STABILITY_WINDOW_SECONDS + 1);
        let count = tracker.record_exit(past_window);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_within_window_does_not_reset() {
        let mut tracker = RestartTracker::new();
        let t0 = Utc::now();
        tracker.record_exit(t0);
        tracker.mark_running(t0);
        let still_within = t0 + Duration::seconds(STABILITY_WINDOW_SECONDS - 1);
        let count = tracker.record_exit(still_within);
        assert_eq!(count, 2);
    }
}
