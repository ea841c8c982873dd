//! `trades_<user>` and `active_trades_<user>`: exclusively owned by
//! TradeManager and ATS.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use reccore::{
    ActiveTrade, EntryMethod, EventTicker, Price, TicketId, Trade, TradeSide, TradeStatus,
};

use crate::error::Result;
use crate::ident::validate_user_id;
use crate::notify::{ChangeNotifier, DbChange};

#[derive(FromRow)]
struct TradeRow {
    id: i64,
    ticket_id: String,
    symbol: String,
    contract: String,
    side: String,
    strike: Decimal,
    buy_price: Decimal,
    position: i64,
    fees: Decimal,
    prob: Decimal,
    diff: Decimal,
    momentum: Decimal,
    symbol_open: Decimal,
    status: String,
    entry_method: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TradeRow> for Trade {
    type Error = crate::error::StoreError;

    fn try_from(row: TradeRow) -> Result<Self> {
        Ok(Trade {
            id: row.id as u64,
            ticket_id: TicketId::from_string(row.ticket_id),
            symbol: row.symbol,
            contract: EventTicker::new(row.contract),
            side: parse_side(&row.side),
            strike: Price::new(row.strike),
            buy_price: Price::new(row.buy_price),
            position: row.position,
            fees: Price::new(row.fees),
            prob: row.prob,
            diff: row.diff,
            momentum: row.momentum,
            symbol_open: Price::new(row.symbol_open),
            status: parse_status(&row.status),
            entry_method: parse_entry_method(&row.entry_method),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_side(s: &str) -> TradeSide {
    match s {
        "NO" => TradeSide::No,
        _ => TradeSide::Yes,
    }
}

fn parse_status(s: &str) -> TradeStatus {
    match s {
        "open" => TradeStatus::Open,
        "closing" => TradeStatus::Closing,
        "closed" => TradeStatus::Closed,
        "failed" => TradeStatus::Failed,
        _ => TradeStatus::Pending,
    }
}

fn parse_entry_method(s: &str) -> EntryMethod {
    match s {
        "auto" => EntryMethod::Auto,
        _ => EntryMethod::Manual,
    }
}

pub struct TradeTable {
    pool: PgPool,
    notifier: ChangeNotifier,
}

impl TradeTable {
    pub fn new(pool: PgPool, notifier: ChangeNotifier) -> Self {
        Self { pool, notifier }
    }

    /// Insert a new trade in `pending` status. Idempotent by `ticket_id`:
    /// a retried insert for an existing ticket is a no-op that returns the
    /// existing row's id.
    pub async fn insert_pending(&self, user: &str, trade: &Trade) -> Result<()> {
        validate_user_id(user)?;
        let table = format!("trades_{user}");
        let sql = format!(
            "INSERT INTO {table}
                (id, ticket_id, symbol, contract, side, strike, buy_price, position,
                 fees, prob, diff, momentum, symbol_open, status, entry_method,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
             ON CONFLICT (ticket_id) DO NOTHING"
        );
        sqlx::query(&sql)
            .bind(trade.id as i64)
            .bind(trade.ticket_id.as_str())
            .bind(&trade.symbol)
            .bind(trade.contract.as_str())
            .bind(trade.side.to_string())
            .bind(trade.strike.inner())
            .bind(trade.buy_price.inner())
            .bind(trade.position)
            .bind(trade.fees.inner())
            .bind(trade.prob)
            .bind(trade.diff)
            .bind(trade.momentum)
            .bind(trade.symbol_open.inner())
            .bind(trade.status.to_string())
            .bind(trade.entry_method.to_string())
            .bind(trade.created_at)
            .bind(trade.updated_at)
            .execute(&self.pool)
            .await?;

        self.notifier
            .publish(DbChange::new("trades", Some(user.to_string())))
            .await;
        Ok(())
    }

    /// Apply a status transition by `ticket_id`. No-op (returns `Ok(false)`)
    /// if the ticket is unknown or already at `next` — callers treat a
    /// retried transition as idempotent.
    pub async fn transition_status(
        &self,
        user: &str,
        ticket_id: &str,
        next: TradeStatus,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        validate_user_id(user)?;
        let table = format!("trades_{user}");
        let sql = format!(
            "UPDATE {table} SET status = $1, updated_at = $2
             WHERE ticket_id = $3 AND status != $1"
        );
        let result = sqlx::query(&sql)
            .bind(next.to_string())
            .bind(now)
            .bind(ticket_id)
            .execute(&self.pool)
            .await?;

        let changed = result.rows_affected() > 0;
        if changed {
            self.notifier
                .publish(DbChange::new("trades", Some(user.to_string())))
                .await;
        }
        Ok(changed)
    }

    /// Whether a trade on `contract` reached `closed`/`failed` status at or
    /// after `since` — backs AutoEntryEngine's re-entry guard (spec.md
    /// §4.7), which treats a terminal trade on the same contract today as a
    /// reason to skip unless `allow_re_entry` is set.
    pub async fn has_terminal_trade_since(
        &self,
        user: &str,
        contract: &str,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        validate_user_id(user)?;
        let table = format!("trades_{user}");
        let sql = format!(
            "SELECT 1 FROM {table}
             WHERE contract = $1 AND status IN ('closed', 'failed') AND created_at >= $2
             LIMIT 1"
        );
        let row: Option<(i32,)> = sqlx::query_as(&sql)
            .bind(contract)
            .bind(since)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Fetch one trade by its internal id, for TradeManager's `close_trade`
    /// lookup (close intents carry `trade_id`, not `ticket_id`).
    pub async fn get_by_id(&self, user: &str, trade_id: u64) -> Result<Option<Trade>> {
        validate_user_id(user)?;
        let table = format!("trades_{user}");
        let sql = format!(
            "SELECT id, ticket_id, symbol, contract, side, strike, buy_price, position,
                    fees, prob, diff, momentum, symbol_open, status, entry_method,
                    created_at, updated_at
             FROM {table} WHERE id = $1"
        );
        let row: Option<TradeRow> = sqlx::query_as(&sql)
            .bind(trade_id as i64)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Trade::try_from).transpose()
    }

    pub async fn get_non_terminal(&self, user: &str) -> Result<Vec<Trade>> {
        validate_user_id(user)?;
        let table = format!("trades_{user}");
        let sql = format!(
            "SELECT id, ticket_id, symbol, contract, side, strike, buy_price, position,
                    fees, prob, diff, momentum, symbol_open, status, entry_method,
                    created_at, updated_at
             FROM {table} WHERE status NOT IN ('closed', 'failed')"
        );
        let rows: Vec<TradeRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Trade::try_from).collect()
    }
}

#[derive(FromRow)]
struct ActiveTradeRow {
    trade_id: i64,
    current_symbol_price: Decimal,
    current_close_price: Decimal,
    buffer_from_strike: Decimal,
    time_since_entry: i64,
    ttc_seconds: i64,
    current_probability: Decimal,
    current_pnl: Decimal,
    last_updated: DateTime<Utc>,
}

impl From<ActiveTradeRow> for ActiveTrade {
    fn from(row: ActiveTradeRow) -> Self {
        ActiveTrade {
            trade_id: row.trade_id as u64,
            current_symbol_price: Price::new(row.current_symbol_price),
            current_close_price: Price::new(row.current_close_price),
            buffer_from_strike: Price::new(row.buffer_from_strike),
            time_since_entry: row.time_since_entry,
            ttc_seconds: row.ttc_seconds,
            current_probability: row.current_probability,
            current_pnl: Price::new(row.current_pnl),
            last_updated: row.last_updated,
        }
    }
}

pub struct ActiveTradeTable {
    pool: PgPool,
    notifier: ChangeNotifier,
}

impl ActiveTradeTable {
    pub fn new(pool: PgPool, notifier: ChangeNotifier) -> Self {
        Self { pool, notifier }
    }

    pub async fn upsert(&self, user: &str, row: &ActiveTrade) -> Result<()> {
        validate_user_id(user)?;
        let table = format!("active_trades_{user}");
        let sql = format!(
            "INSERT INTO {table}
                (trade_id, current_symbol_price, current_close_price, buffer_from_strike,
                 time_since_entry, ttc_seconds, current_probability, current_pnl, last_updated)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (trade_id) DO UPDATE SET
                current_symbol_price = EXCLUDED.current_symbol_price,
                current_close_price = EXCLUDED.current_close_price,
                buffer_from_strike = EXCLUDED.buffer_from_strike,
                time_since_entry = EXCLUDED.time_since_entry,
                ttc_seconds = EXCLUDED.ttc_seconds,
                current_probability = EXCLUDED.current_probability,
                current_pnl = EXCLUDED.current_pnl,
                last_updated = EXCLUDED.last_updated"
        );
        sqlx::query(&sql)
            .bind(row.trade_id as i64)
            .bind(row.current_symbol_price.inner())
            .bind(row.current_close_price.inner())
            .bind(row.buffer_from_strike.inner())
            .bind(row.time_since_entry)
            .bind(row.ttc_seconds)
            .bind(row.current_probability)
            .bind(row.current_pnl.inner())
            .bind(row.last_updated)
            .execute(&self.pool)
            .await?;

        self.notifier
            .publish(DbChange::new("active_trades", Some(user.to_string())))
            .await;
        Ok(())
    }

    /// Remove the row once its trade reaches a terminal status.
    pub async fn remove(&self, user: &str, trade_id: u64) -> Result<()> {
        validate_user_id(user)?;
        let table = format!("active_trades_{user}");
        let sql = format!("DELETE FROM {table} WHERE trade_id = $1");
        sqlx::query(&sql)
            .bind(trade_id as i64)
            .execute(&self.pool)
            .await?;

        self.notifier
            .publish(DbChange::new("active_trades", Some(user.to_string())))
            .await;
        Ok(())
    }

    pub async fn get_all(&self, user: &str) -> Result<Vec<ActiveTrade>> {
        validate_user_id(user)?;
        let table = format!("active_trades_{user}");
        let sql = format!(
            "SELECT trade_id, current_symbol_price, current_close_price, buffer_from_strike,
                    time_since_entry, ttc_seconds, current_probability, current_pnl, last_updated
             FROM {table}"
        );
        let rows: Vec<ActiveTradeRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ActiveTrade::from).collect())
    }
}
