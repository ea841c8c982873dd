//! Cascading failure detection for the REC.IO trading core.
//!
//! Watches the Supervisor for services reaching FATAL; when enough
//! distinct services go FATAL inside a short rolling window, issues a
//! MASTER_RESTART through the Supervisor's HTTP control surface, subject
//! to a once-until-manually-reset latch and an hourly rate budget.

pub mod client;
pub mod detector;
pub mod error;
pub mod latch;
pub mod rate_limit;
pub mod window;

pub use client::SupervisorClient;
pub use detector::{CascadingFailureDetector, DetectorConfig};
pub use error::{CfdError, Result};
pub use latch::CascadeLatch;
pub use rate_limit::RestartRateLimiter;
pub use window::{FailureWindowConfig, FailureWindowTracker};
