//! Shared predicate/gate primitives for ActiveTradeSupervisor and
//! AutoEntryEngine.
//!
//! Every predicate is a pure function of already-computed scalar inputs,
//! never a raw market snapshot — the component evaluating the predicate
//! (ATS or AutoEntryEngine) owns the modeling math; `recrisk` owns only
//! the comparison against preferences. This keeps adding a predicate a
//! one-function-plus-one-call-site change, matching the teacher's own
//! gate style.

pub mod auto_entry;
pub mod auto_stop;
pub mod error;

pub use auto_entry::{
    differential_gate, probability_gate, re_entry_guard, time_window_gate, ttc_gate,
    watchlist_gate, EntryRejectReason, SpikeCooldownTracker,
};
pub use auto_stop::{momentum_spike, probability_floor, ttc_floor, AutoStopReason};
pub use error::{RiskError, RiskResult};
