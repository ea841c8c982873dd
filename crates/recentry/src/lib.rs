//! AutoEntryEngine: converts the watchlist, live market data, and
//! per-user preferences into trade entry intents (spec.md §4.7).
//!
//! `engine` owns the tick loop: it samples spot prices into `momentum`
//! and `volatility`, derives a modeled probability (`model`) for each
//! watched market, evaluates `recrisk::auto_entry`'s gate set, and
//! delivers passing candidates to TradeManager through the injected
//! `open::EntryOpener`. Degraded market/price data suspends entry
//! generation entirely, a stricter response than ATS's auto-stop-only
//! suspension (spec.md §5).

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod momentum;
pub mod open;
pub mod volatility;

pub use config::{EngineConfig, WatchedMarket};
pub use engine::AutoEntryEngine;
pub use error::{EntryError, EntryResult};
pub use model::modeled_probability_yes;
pub use momentum::{MomentumTracker, MOMENTUM_WINDOW_SECONDS};
pub use open::EntryOpener;
pub use volatility::{VolatilityTracker, DEFAULT_DAILY_VOLATILITY, VOLATILITY_WINDOW_SECONDS};
