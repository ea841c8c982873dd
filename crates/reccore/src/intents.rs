//! Trade-intent and ticket-tracking types shared by AutoEntryEngine, ATS,
//! TradeManager, and TradeExecutor.

use serde::{Deserialize, Serialize};

use crate::market::EventTicker;
use crate::order::{EntryMethod, TicketId, TradeSide};
use crate::Price;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// An entry intent produced by AutoEntryEngine (or a manual UI call),
/// delivered to TradeManager's `open_trade`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryIntent {
    pub symbol: String,
    pub contract: EventTicker,
    pub side: TradeSide,
    pub strike: Price,
    pub limit_price: Price,
    /// `position_size * multiplier` from preferences.
    pub size: i64,
    pub entry_method: EntryMethod,
    pub prob: Decimal,
    pub diff: Decimal,
    pub momentum: Decimal,
    pub symbol_open: Price,
    pub created_at: DateTime<Utc>,
}

/// A close intent produced by an ATS auto-stop predicate (or a manual UI
/// call), delivered to TradeManager's `close_trade`.
///
/// `seq` is a monotonic counter assigned by ATS; it is not an identity —
/// the dedup key is `trade_id`. At most one close intent per `trade_id`
/// is ever allowed to reach the drain worker across a trade's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseIntent {
    pub trade_id: u64,
    pub seq: u64,
    pub created_at_unix_ms: i64,
}

impl CloseIntent {
    pub fn new(trade_id: u64, seq: u64, created_at_unix_ms: i64) -> Self {
        Self {
            trade_id,
            seq,
            created_at_unix_ms,
        }
    }
}

/// State of a ticket in its exchange lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TicketState {
    #[default]
    Pending,
    Open,
    PartialFilled,
    Filled,
    Cancelled,
    Rejected,
}

impl TicketState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Open | Self::PartialFilled)
    }
}

/// A ticket tracked by TradeExecutor from submission through completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedTicket {
    pub ticket_id: TicketId,
    pub contract: EventTicker,
    pub side: TradeSide,
    pub price: Price,
    pub size: i64,
    pub filled_size: i64,
    pub state: TicketState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackedTicket {
    #[must_use]
    pub fn new(ticket_id: TicketId, contract: EventTicker, side: TradeSide, price: Price, size: i64, now: DateTime<Utc>) -> Self {
        Self {
            ticket_id,
            contract,
            side,
            price,
            size,
            filled_size: 0,
            state: TicketState::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[must_use]
    pub fn remaining_size(&self) -> i64 {
        self.size - self.filled_size
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.state == TicketState::Filled || self.filled_size >= self.size
    }
}

/// Result of attempting to enqueue a ticket onto the executor's
/// single-writer queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnqueueResult {
    Queued,
    QueuedDegraded,
    QueueFull,
    InflightFull,
}

impl EnqueueResult {
    #[must_use]
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued | Self::QueuedDegraded)
    }
}

/// Reason an intent was rejected outright (never reaches the exchange).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    NotReady,
    HardStop,
    QueueFull,
    InflightFull,
    MarketDataUnavailable,
    DuplicateTicket,
    PermanentExchangeError,
}

/// Reason an intent was intentionally dropped, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkipReason {
    AlreadyInFlight,
    DuplicateCloseIntent,
    TradeAlreadyTerminal,
}

/// Result of processing an entry or close intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionResult {
    Queued { ticket_id: TicketId },
    QueuedDegraded { ticket_id: TicketId },
    Rejected { reason: RejectReason },
    Skipped { reason: SkipReason },
}

impl ExecutionResult {
    #[must_use]
    pub fn queued(ticket_id: TicketId) -> Self {
        Self::Queued { ticket_id }
    }

    #[must_use]
    pub fn queued_degraded(ticket_id: TicketId) -> Self {
        Self::QueuedDegraded { ticket_id }
    }

    #[must_use]
    pub fn rejected(reason: RejectReason) -> Self {
        Self::Rejected { reason }
    }

    #[must_use]
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    #[must_use]
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. } | Self::QueuedDegraded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_ticket() -> TrackedTicket {
        TrackedTicket::new(
            TicketId::new(),
            EventTicker::new("KXBTCD-TEST"),
            TradeSide::Yes,
            Price::new(dec!(61)),
            1,
            Utc::now(),
        )
    }

    #[test]
    fn test_tracked_ticket_starts_pending() {
        let t = sample_ticket();
        assert_eq!(t.state, TicketState::Pending);
        assert_eq!(t.remaining_size(), 1);
        assert!(!t.is_filled());
    }

    #[test]
    fn test_ticket_state_terminal_vs_active() {
        assert!(TicketState::Pending.is_active());
        assert!(TicketState::Filled.is_terminal());
        assert!(TicketState::Rejected.is_terminal());
        assert!(!TicketState::Filled.is_active());
    }

    #[test]
    fn test_enqueue_result_queued() {
        assert!(EnqueueResult::Queued.is_queued());
        assert!(EnqueueResult::QueuedDegraded.is_queued());
        assert!(!EnqueueResult::QueueFull.is_queued());
        assert!(!EnqueueResult::InflightFull.is_queued());
    }

    #[test]
    fn test_execution_result_constructors() {
        let id = TicketId::new();
        assert!(ExecutionResult::queued(id.clone()).is_queued());
        assert!(ExecutionResult::queued_degraded(id).is_queued());
        assert!(!ExecutionResult::rejected(RejectReason::HardStop).is_queued());
        assert!(!ExecutionResult::skipped(SkipReason::AlreadyInFlight).is_queued());
    }

    #[test]
    fn test_close_intent_identity_is_trade_id() {
        let a = CloseIntent::new(42, 1, 1_000);
        let b = CloseIntent::new(42, 2, 2_000);
        assert_eq!(a.trade_id, b.trade_id);
        assert_ne!(a.seq, b.seq);
    }
}
