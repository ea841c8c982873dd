//! TradeManager and TradeExecutor: the intent-to-order pipeline for
//! REC.IO (spec.md §4.8-§4.9).
//!
//! `TradeExecutor` owns the single-writer queue that talks to Kalshi;
//! `TradeManager` owns a user's `trades_<user>` table and is the only
//! thing allowed to call `TradeExecutor`. Both `recats::ActiveTradeSupervisor`
//! and `recentry::AutoEntryEngine` are handed a `TradeManager` behind the
//! `TradeCloser`/`EntryOpener` trait objects rather than depending on this
//! crate's concrete types directly.

pub mod client;
pub mod error;
pub mod executor;
pub mod manager;

pub use client::{OrderAction, OrderClient, OrderType, RawOrderAck};
pub use error::{ExecutorError, ExecutorResult, TradeError, TradeResult};
pub use executor::TradeExecutor;
pub use manager::TradeManager;
