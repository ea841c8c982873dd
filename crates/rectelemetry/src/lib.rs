//! Prometheus metrics and structured logging for REC.IO.
//!
//! Provides observability from Day 1:
//! - Prometheus metrics for entry signals, feed latency, risk gates, and
//!   trade execution
//! - Structured JSON logging with tracing
//! - Daily statistics output

pub mod daily_stats;
pub mod error;
pub mod logging;
pub mod metrics;

pub use daily_stats::{ContractDailyStats, DailyStatsReporter};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
