//! ActiveTradeSupervisor (ATS): the authoritative monitor for every open
//! trade and the enforcer of auto-stop (spec.md §4.6).
//!
//! `supervisor` owns the 1 Hz tick loop: it snapshots non-terminal trades,
//! computes per-trade metrics (`metrics`) and rolling momentum
//! (`momentum`), upserts ActiveTrade rows, and evaluates
//! `recrisk::auto_stop`'s predicate set. A triggered predicate produces a
//! `close::CloseIntent`, drained by a single serialized worker that calls
//! into TradeManager through the injected `close::TradeCloser` — this
//! indirection exists because `rectrade` already depends on `recats`, so a
//! direct call back up would be circular. `cache` is the short-TTL read
//! cache the UI polls instead of hitting Postgres every request.

pub mod cache;
pub mod close;
pub mod error;
pub mod metrics;
pub mod momentum;
pub mod supervisor;

pub use cache::ActiveTradeCache;
pub use close::{drain_close_intents, TradeCloser};
pub use error::{AtsError, AtsResult};
pub use momentum::{MomentumTracker, MOMENTUM_WINDOW_SECONDS};
pub use supervisor::{
    ActiveTradeSupervisor, ActiveTradeSupervisorConfig, DEFAULT_TICK_INTERVAL, MAX_TICK_INTERVAL,
};
