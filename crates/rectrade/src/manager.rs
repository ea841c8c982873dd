//! TradeManager (spec.md §4.8): the sole writer of a user's `trades_<user>`
//! table, and the seam both AutoEntryEngine and ActiveTradeSupervisor call
//! into to turn an intent into a standing position.
//!
//! Grounded on `recaccount::sync::AccountSync`'s shape (one struct owning a
//! `TradeTable` handle plus whatever clients it needs) and on
//! `recats::close::TradeCloser` / `recentry::open::EntryOpener`, the two
//! seam traits this type implements so the supervisor and the entry engine
//! never depend on `rectrade` directly for anything but the trait object.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use reccore::{CloseIntent, EntryIntent, Price, Trade, TradeStatus};
use recats::close::TradeCloser;
use recentry::open::EntryOpener;
use recstore::trades::TradeTable;

use crate::error::{TradeError, TradeResult};
use crate::executor::TradeExecutor;

/// Derive a stable ticket id from an intent's identity so a bit-identical
/// retried `EntryIntent` (AutoEntryEngine re-delivering after a timeout,
/// for instance) maps to the same id and `insert_pending`'s
/// `ON CONFLICT DO NOTHING` makes the retry a no-op, satisfying the
/// at-most-one-open-per-intent property (spec.md §8, L1).
///
/// `EntryIntent` carries no id of its own, unlike `CloseIntent`'s
/// `trade_id`, so this is TradeManager's own scheme rather than something
/// reused from the exchange.
fn deterministic_ticket_id(intent: &EntryIntent) -> reccore::TicketId {
    let mut hasher = DefaultHasher::new();
    intent.contract.as_str().hash(&mut hasher);
    intent.side.hash(&mut hasher);
    intent.created_at.timestamp_millis().hash(&mut hasher);
    let digest = hasher.finish();
    reccore::TicketId::from_string(format!("tkt_det_{digest:016x}"))
}

/// Owns the user's trade table and the executor queue that places and
/// flattens orders on its behalf. One instance per user, wired up once at
/// process startup and shared (via `Arc`) across the entry engine, the
/// active trade supervisor, and any RPC surface that reads trade state.
pub struct TradeManager {
    user: String,
    trades: TradeTable,
    executor: Arc<TradeExecutor>,
    next_id: AtomicU64,
}

impl TradeManager {
    pub fn new(user: impl Into<String>, trades: TradeTable, executor: Arc<TradeExecutor>) -> Self {
        Self {
            user: user.into(),
            trades,
            executor,
            // recstore has no DB-side id sequence (trades_<user> has no
            // SERIAL column); seed from wall-clock so ids stay monotonic
            // and collision-free across restarts without a round-trip to
            // the database to find the current max.
            next_id: AtomicU64::new(Utc::now().timestamp_millis().max(0) as u64),
        }
    }

    fn next_trade_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Insert the pending row, submit the buy order, and transition to
    /// `open` (or `failed`) based on the executor's outcome. Safe to call
    /// twice with an intent that hashes to the same ticket id: the second
    /// call's `insert_pending` is a no-op and the order is resubmitted
    /// under the same exchange-side idempotency key.
    pub async fn open_trade(&self, intent: EntryIntent) -> TradeResult<()> {
        let ticket_id = deterministic_ticket_id(&intent);
        let now = Utc::now();

        let trade = Trade {
            id: self.next_trade_id(),
            ticket_id: ticket_id.clone(),
            symbol: intent.symbol.clone(),
            contract: intent.contract.clone(),
            side: intent.side,
            strike: intent.strike,
            buy_price: intent.limit_price,
            position: intent.size,
            fees: Price::ZERO,
            prob: intent.prob,
            diff: intent.diff,
            momentum: intent.momentum,
            symbol_open: intent.symbol_open,
            status: TradeStatus::Pending,
            entry_method: intent.entry_method,
            created_at: now,
            updated_at: now,
        };

        self.trades.insert_pending(&self.user, &trade).await?;

        info!(ticket_id = %ticket_id, contract = %intent.contract.as_str(), "submitting entry order");

        match self
            .executor
            .submit_open(
                &ticket_id,
                &intent.contract,
                intent.side,
                intent.limit_price,
                intent.size,
            )
            .await
        {
            Ok(ack) => {
                info!(ticket_id = %ticket_id, order_id = %ack.order_id, "entry order placed");
                self.trades
                    .transition_status(&self.user, ticket_id.as_str(), TradeStatus::Open, Utc::now())
                    .await?;
                Ok(())
            }
            Err(err) => {
                warn!(ticket_id = %ticket_id, error = %err, "entry order failed, marking trade failed");
                self.trades
                    .transition_status(&self.user, ticket_id.as_str(), TradeStatus::Failed, Utc::now())
                    .await?;
                Err(TradeError::ExecutorRejected(ticket_id, err.to_string()))
            }
        }
    }

    /// Flatten an open position by submitting an offsetting market sell,
    /// then transition `open -> closing -> closed`. A Kalshi position is
    /// closed by trading out of it, not by cancelling the original resting
    /// order, so this always places a new order rather than touching the
    /// entry ticket.
    pub async fn close_trade(&self, trade_id: u64) -> TradeResult<()> {
        let trade = self
            .trades
            .get_by_id(&self.user, trade_id)
            .await?
            .ok_or(TradeError::UnknownTrade(trade_id))?;

        if trade.status.is_terminal() {
            info!(trade_id, status = %trade.status, "close_trade on already-terminal trade, skipping");
            return Ok(());
        }

        if !trade.status.can_transition_to(TradeStatus::Closing) {
            // Already `closing` (a duplicate close intent) or `pending`
            // (the open order hasn't even landed yet) - `transition_status`
            // below is the idempotent guard; nothing to do here but leave
            // it alone rather than force an invalid edge.
            info!(trade_id, status = %trade.status, "close_trade no-op, trade not in open state");
            return Ok(());
        }

        let moved = self
            .trades
            .transition_status(&self.user, trade.ticket_id.as_str(), TradeStatus::Closing, Utc::now())
            .await?;
        if !moved {
            // Lost the race to another close_trade call; that one will
            // carry the close through.
            return Ok(());
        }

        info!(ticket_id = %trade.ticket_id, "submitting close order");

        match self
            .executor
            .submit_close(&trade.ticket_id, &trade.contract, trade.side, trade.position)
            .await
        {
            Ok(ack) => {
                info!(ticket_id = %trade.ticket_id, order_id = %ack.order_id, "close order placed");
                self.trades
                    .transition_status(&self.user, trade.ticket_id.as_str(), TradeStatus::Closed, Utc::now())
                    .await?;
                Ok(())
            }
            Err(err) => {
                // TradeStatus has no Closing -> Failed edge: a permanently
                // failed close leaves the trade stuck in `closing` for
                // manual intervention or a later AccountSync reconciliation
                // pass, rather than silently losing track of it.
                error!(
                    ticket_id = %trade.ticket_id,
                    error = %err,
                    "close order failed, trade remains in closing state"
                );
                Err(TradeError::ExecutorRejected(trade.ticket_id, err.to_string()))
            }
        }
    }
}

#[async_trait]
impl TradeCloser for TradeManager {
    async fn close_trade(&self, intent: CloseIntent) -> Result<(), String> {
        Self::close_trade(self, intent.trade_id)
            .await
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl EntryOpener for TradeManager {
    async fn open_trade(&self, intent: EntryIntent) -> Result<(), String> {
        Self::open_trade(self, intent)
            .await
            .map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use reccore::{EntryMethod, EventTicker, TradeSide};
    use rust_decimal_macros::dec;

    fn sample_intent(created_at_ms: i64) -> EntryIntent {
        EntryIntent {
            symbol: "BTC".to_string(),
            contract: EventTicker::new("KXBTCD-25JUL30-T100000"),
            side: TradeSide::Yes,
            strike: Price::new(dec!(100000)),
            limit_price: Price::new(dec!(61)),
            size: 10,
            entry_method: EntryMethod::Auto,
            prob: dec!(0.61),
            diff: dec!(0.05),
            momentum: dec!(0.01),
            symbol_open: Price::new(dec!(99500)),
            created_at: Utc.timestamp_millis_opt(created_at_ms).unwrap(),
        }
    }

    #[test]
    fn test_deterministic_ticket_id_stable_for_identical_intent() {
        let a = sample_intent(1_700_000_000_000);
        let b = sample_intent(1_700_000_000_000);
        assert_eq!(deterministic_ticket_id(&a), deterministic_ticket_id(&b));
    }

    #[test]
    fn test_deterministic_ticket_id_differs_for_different_timestamps() {
        let a = sample_intent(1_700_000_000_000);
        let b = sample_intent(1_700_000_000_001);
        assert_ne!(deterministic_ticket_id(&a), deterministic_ticket_id(&b));
    }
}
