//! Process supervisor for the REC.IO trading core.
//!
//! Owns every long-running service (price feeds, market feed, account sync,
//! trade manager/executor, active trade supervisor, auto entry engine,
//! cascading failure detector) as a child process group, restarts crashed
//! services with a bounded-retry policy, and exposes an HTTP control
//! surface for the dashboard and the cascading failure detector's
//! MASTER_RESTART action.

pub mod backoff;
pub mod error;
pub mod process;
pub mod rpc;
pub mod state;
pub mod supervisor;

pub use error::{Result, SupervisorError};
pub use rpc::{create_router, AppState};
pub use supervisor::{spawn_actor, SupervisorHandle};
