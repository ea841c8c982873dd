//! CascadingFailureDetector: watches Supervisor FATAL events and issues a
//! rate-limited MASTER_RESTART when enough distinct services go FATAL
//! within a short window.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::client::SupervisorClient;
use crate::latch::CascadeLatch;
use crate::rate_limit::RestartRateLimiter;
use crate::window::{FailureWindowConfig, FailureWindowTracker};

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub window: FailureWindowConfig,
    pub max_restarts_per_hour: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            window: FailureWindowConfig::default(),
            max_restarts_per_hour: 2,
        }
    }
}

pub struct CascadingFailureDetector {
    tracker: FailureWindowTracker,
    latch: CascadeLatch,
    rate_limiter: RestartRateLimiter,
    supervisor: SupervisorClient,
}

impl CascadingFailureDetector {
    pub fn new(config: DetectorConfig, supervisor: SupervisorClient) -> Self {
        Self {
            tracker: FailureWindowTracker::new(config.window),
            latch: CascadeLatch::new(),
            rate_limiter: RestartRateLimiter::new(config.max_restarts_per_hour),
            supervisor,
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.latch.is_tripped()
    }

    pub fn reset(&self) {
        self.latch.reset();
    }

    /// Call whenever the Supervisor reports a service reaching FATAL.
    /// Issues MASTER_RESTART if the cascade threshold is crossed, the
    /// latch isn't already tripped, and the hourly restart budget allows
    /// it.
    pub async fn on_service_fatal(&self, service: &str, now: DateTime<Utc>) {
        let distinct_count = self.tracker.record_fatal(service, now);
        if !self.tracker.is_cascading(distinct_count) {
            return;
        }

        if self.latch.is_tripped() {
            warn!(
                service,
                distinct_count, "cascade threshold crossed again but detector already tripped"
            );
            return;
        }

        if !self.rate_limiter.try_consume(now) {
            warn!(
                service,
                distinct_count, "cascade threshold crossed but hourly restart budget is exhausted"
            );
            return;
        }

        if !self.latch.trip(now) {
            return;
        }

        info!(
            service,
            distinct_count, "cascading failure detected, issuing MASTER_RESTART"
        );
        if let Err(err) = self.supervisor.master_restart().await {
            warn!(error = %err, "MASTER_RESTART request failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> CascadingFailureDetector {
        let config = DetectorConfig {
            window: FailureWindowConfig {
                window_seconds: 300,
                cascade_threshold: 2,
            },
            max_restarts_per_hour: 2,
        };
        CascadingFailureDetector::new(config, SupervisorClient::new("http://127.0.0.1:1"))
    }

    #[tokio::test]
    async fn test_below_threshold_does_not_trip() {
        let d = detector();
        d.on_service_fatal("trade_executor", Utc::now()).await;
        assert!(!d.is_tripped());
    }

    #[tokio::test]
    async fn test_crossing_threshold_trips_latch() {
        let d = detector();
        let now = Utc::now();
        d.on_service_fatal("trade_executor", now).await;
        d.on_service_fatal("trade_manager", now).await;
        assert!(d.is_tripped());
    }

    #[tokio::test]
    async fn test_reset_allows_retrip() {
        let d = detector();
        let now = Utc::now();
        d.on_service_fatal("trade_executor", now).await;
        d.on_service_fatal("trade_manager", now).await;
        assert!(d.is_tripped());

        d.reset();
        assert!(!d.is_tripped());

        d.on_service_fatal("active_trade_supervisor", now).await;
        d.on_service_fatal("auto_entry_supervisor", now).await;
        assert!(d.is_tripped());
    }
}
