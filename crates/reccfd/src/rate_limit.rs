//! Caps how many MASTER_RESTART actions can fire within a rolling hour,
//! independent of the [`crate::latch::CascadeLatch`] — the latch stops
//! repeat triggers from the *same* cascade; this stops a detector that
//! gets manually reset too eagerly from restarting the whole fleet
//! indefinitely.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

pub struct RestartRateLimiter {
    max_per_hour: usize,
    recent: Mutex<VecDeque<DateTime<Utc>>>,
}

impl RestartRateLimiter {
    pub fn new(max_per_hour: usize) -> Self {
        Self {
            max_per_hour,
            recent: Mutex::new(VecDeque::new()),
        }
    }

    /// Attempt to consume one restart slot. Returns `true` if allowed (and
    /// records it), `false` if the hourly budget is exhausted.
    pub fn try_consume(&self, now: DateTime<Utc>) -> bool {
        let mut recent = self.recent.lock();
        let cutoff = now - Duration::hours(1);
        while recent.front().is_some_and(|ts| *ts < cutoff) {
            recent.pop_front();
        }

        if recent.len() >= self.max_per_hour {
            return false;
        }

        recent.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget_of_two_allows_two_then_blocks() {
        let limiter = RestartRateLimiter::new(2);
        let now = Utc::now();
        assert!(limiter.try_consume(now));
        assert!(limiter.try_consume(now));
        assert!(!limiter.try_consume(now));
    }

    #[test]
    fn test_budget_replenishes_after_an_hour() {
        let limiter = RestartRateLimiter::new(1);
        let t0 = Utc::now();
        assert!(limiter.try_consume(t0));
        assert!(!limiter.try_consume(t0));

        let later = t0 + Duration::hours(1) + Duration::seconds(1);
        assert!(limiter.try_consume(later));
    }
}
