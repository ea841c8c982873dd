//! Per-service runtime bookkeeping held by the Supervisor actor.

use tokio::process::Child;

use reccore::{ServiceState, ServiceStatus};
use recconfig::ServiceRecord;

use crate::backoff::RestartTracker;

/// Everything the actor needs to track for one supervised service between
/// commands. Not `Clone` — the live [`Child`] handle lives here exactly
/// once; callers only ever see the derived [`ServiceState`] snapshot.
pub struct Runtime {
    pub record: ServiceRecord,
    pub state: ServiceState,
    pub tracker: RestartTracker,
    pub child: Option<Child>,
    /// Set just before a deliberate stop/restart so the exit-watcher does
    /// not interpret the resulting exit as a crash.
    pub stopping: bool,
}

impl Runtime {
    pub fn new(record: ServiceRecord) -> Self {
        let state = ServiceState::new(record.name.clone());
        Self {
            record,
            state,
            tracker: RestartTracker::new(),
            child: None,
            stopping: false,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self.state.status,
            ServiceStatus::Starting | ServiceStatus::Running | ServiceStatus::Restarting
        )
    }
}
