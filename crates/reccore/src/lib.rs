//! Core domain types for the REC.IO trading core.
//!
//! This crate provides the fundamental types shared across every service:
//! - `Price`, `Size`: precision-safe numeric newtypes
//! - `EventTicker`, `MarketSnapshot`: Kalshi market identification and quotes
//! - `Trade`, `ActiveTrade`, `PriceTick`: the persisted data model (§3)
//! - `Preferences`, `ServiceState`, `PortAssignment`: configuration-adjacent
//!   entities read and written across process boundaries
//! - `EntryIntent`, `CloseIntent`, `TrackedTicket`: the trade-intent pipeline

pub mod account;
pub mod decimal;
pub mod error;
pub mod est_time;
pub mod intents;
pub mod market;
pub mod order;
pub mod types;

pub use account::{BalanceSnapshot, FillRecord, OrderRecord, OrderStatus, PositionRecord, SettlementRecord};
pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use est_time::{
    is_expired, now_rounded_to_second, rolling_window_cutoff, round_to_second, start_of_est_day,
    to_est_iso8601, ROLLING_WINDOW_DAYS,
};
pub use intents::{
    CloseIntent, EnqueueResult, EntryIntent, ExecutionResult, RejectReason, SkipReason,
    TicketState, TrackedTicket,
};
pub use market::{BookState, EventTicker, MarketSnapshot, MarketStatus};
pub use order::{EntryMethod, TicketId, TradeSide, TradeStatus};
pub use types::{
    ActiveTrade, PortAssignment, Preferences, PriceTick, ServiceState, ServiceStatus, Trade,
};
