//! `orders_<user>`, `fills_<user>`, `positions_<user>`, `settlements_<user>`,
//! `balance_<user>`: owned exclusively by AccountSync. Upserts key on the
//! exchange's own identifiers; rows are never deleted, only updated.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use reccore::{
    BalanceSnapshot, EventTicker, FillRecord, OrderRecord, OrderStatus, Price, PositionRecord,
    SettlementRecord, TradeSide,
};

use crate::error::Result;
use crate::ident::validate_user_id;
use crate::notify::{ChangeNotifier, DbChange};

fn parse_side(s: &str) -> TradeSide {
    match s {
        "NO" => TradeSide::No,
        _ => TradeSide::Yes,
    }
}

fn parse_order_status(s: &str) -> OrderStatus {
    match s {
        "filled" => OrderStatus::Filled,
        "canceled" => OrderStatus::Canceled,
        _ => OrderStatus::Resting,
    }
}

#[derive(FromRow)]
struct OrderRow {
    order_id: String,
    ticker: String,
    side: String,
    price: Decimal,
    size: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for OrderRecord {
    fn from(row: OrderRow) -> Self {
        OrderRecord {
            order_id: row.order_id,
            ticker: EventTicker::new(row.ticker),
            side: parse_side(&row.side),
            price: Price::new(row.price),
            size: reccore::Size::new(row.size),
            status: parse_order_status(&row.status),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct FillRow {
    trade_id: String,
    order_id: String,
    ticker: String,
    side: String,
    price: Decimal,
    size: Decimal,
    filled_at: DateTime<Utc>,
}

impl From<FillRow> for FillRecord {
    fn from(row: FillRow) -> Self {
        FillRecord {
            trade_id: row.trade_id,
            order_id: row.order_id,
            ticker: EventTicker::new(row.ticker),
            side: parse_side(&row.side),
            price: Price::new(row.price),
            size: reccore::Size::new(row.size),
            filled_at: row.filled_at,
        }
    }
}

#[derive(FromRow)]
struct PositionRow {
    ticker: String,
    side: String,
    quantity: i64,
    average_price: Decimal,
    updated_at: DateTime<Utc>,
}

impl From<PositionRow> for PositionRecord {
    fn from(row: PositionRow) -> Self {
        PositionRecord {
            ticker: EventTicker::new(row.ticker),
            side: parse_side(&row.side),
            quantity: row.quantity,
            average_price: Price::new(row.average_price),
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct SettlementRow {
    ticker: String,
    side: String,
    revenue: Decimal,
    settled_at: DateTime<Utc>,
}

impl From<SettlementRow> for SettlementRecord {
    fn from(row: SettlementRow) -> Self {
        SettlementRecord {
            ticker: EventTicker::new(row.ticker),
            side: parse_side(&row.side),
            revenue: Price::new(row.revenue),
            settled_at: row.settled_at,
        }
    }
}

#[derive(FromRow)]
struct BalanceRow {
    available_balance: Decimal,
    as_of: DateTime<Utc>,
}

impl From<BalanceRow> for BalanceSnapshot {
    fn from(row: BalanceRow) -> Self {
        BalanceSnapshot {
            available_balance: Price::new(row.available_balance),
            as_of: row.as_of,
        }
    }
}

pub struct AccountTables {
    pool: PgPool,
    notifier: ChangeNotifier,
}

impl AccountTables {
    pub fn new(pool: PgPool, notifier: ChangeNotifier) -> Self {
        Self { pool, notifier }
    }

    pub async fn upsert_order(&self, user: &str, order: &OrderRecord) -> Result<()> {
        validate_user_id(user)?;
        let table = format!("orders_{user}");
        let sql = format!(
            "INSERT INTO {table}
                (order_id, ticker, side, price, size, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (order_id) DO UPDATE SET
                price = EXCLUDED.price,
                size = EXCLUDED.size,
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at"
        );
        sqlx::query(&sql)
            .bind(&order.order_id)
            .bind(order.ticker.as_str())
            .bind(order.side.to_string())
            .bind(order.price.inner())
            .bind(order.size.inner())
            .bind(order.status.to_string())
            .bind(order.created_at)
            .bind(order.updated_at)
            .execute(&self.pool)
            .await?;

        self.notifier
            .publish(DbChange::new("orders", Some(user.to_string())))
            .await;
        Ok(())
    }

    pub async fn upsert_fill(&self, user: &str, fill: &FillRecord) -> Result<()> {
        validate_user_id(user)?;
        let table = format!("fills_{user}");
        let sql = format!(
            "INSERT INTO {table}
                (trade_id, order_id, ticker, side, price, size, filled_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (trade_id) DO NOTHING"
        );
        sqlx::query(&sql)
            .bind(&fill.trade_id)
            .bind(&fill.order_id)
            .bind(fill.ticker.as_str())
            .bind(fill.side.to_string())
            .bind(fill.price.inner())
            .bind(fill.size.inner())
            .bind(fill.filled_at)
            .execute(&self.pool)
            .await?;

        self.notifier
            .publish(DbChange::new("fills", Some(user.to_string())))
            .await;
        Ok(())
    }

    pub async fn upsert_position(&self, user: &str, position: &PositionRecord) -> Result<()> {
        validate_user_id(user)?;
        let table = format!("positions_{user}");
        let sql = format!(
            "INSERT INTO {table} (ticker, side, quantity, average_price, updated_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (ticker) DO UPDATE SET
                side = EXCLUDED.side,
                quantity = EXCLUDED.quantity,
                average_price = EXCLUDED.average_price,
                updated_at = EXCLUDED.updated_at"
        );
        sqlx::query(&sql)
            .bind(position.ticker.as_str())
            .bind(position.side.to_string())
            .bind(position.quantity)
            .bind(position.average_price.inner())
            .bind(position.updated_at)
            .execute(&self.pool)
            .await?;

        self.notifier
            .publish(DbChange::new("positions", Some(user.to_string())))
            .await;
        Ok(())
    }

    pub async fn insert_settlement(&self, user: &str, settlement: &SettlementRecord) -> Result<()> {
        validate_user_id(user)?;
        let table = format!("settlements_{user}");
        let sql = format!(
            "INSERT INTO {table} (ticker, side, revenue, settled_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (ticker, side, settled_at) DO NOTHING"
        );
        sqlx::query(&sql)
            .bind(settlement.ticker.as_str())
            .bind(settlement.side.to_string())
            .bind(settlement.revenue.inner())
            .bind(settlement.settled_at)
            .execute(&self.pool)
            .await?;

        self.notifier
            .publish(DbChange::new("settlements", Some(user.to_string())))
            .await;
        Ok(())
    }

    pub async fn record_balance(&self, user: &str, balance: &BalanceSnapshot) -> Result<()> {
        validate_user_id(user)?;
        let table = format!("balance_{user}");
        let sql = format!(
            "INSERT INTO {table} (available_balance, as_of)
             VALUES ($1, $2)
             ON CONFLICT (as_of) DO UPDATE SET available_balance = EXCLUDED.available_balance"
        );
        sqlx::query(&sql)
            .bind(balance.available_balance.inner())
            .bind(balance.as_of)
            .execute(&self.pool)
            .await?;

        self.notifier
            .publish(DbChange::new("balance", Some(user.to_string())))
            .await;
        Ok(())
    }

    pub async fn positions(&self, user: &str) -> Result<Vec<PositionRecord>> {
        validate_user_id(user)?;
        let table = format!("positions_{user}");
        let sql = format!(
            "SELECT ticker, side, quantity, average_price, updated_at FROM {table}"
        );
        let rows: Vec<PositionRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(PositionRecord::from).collect())
    }

    pub async fn latest_balance(&self, user: &str) -> Result<Option<BalanceSnapshot>> {
        validate_user_id(user)?;
        let table = format!("balance_{user}");
        let sql = format!("SELECT available_balance, as_of FROM {table} ORDER BY as_of DESC LIMIT 1");
        let row: Option<BalanceRow> = sqlx::query_as(&sql).fetch_optional(&self.pool).await?;
        Ok(row.map(BalanceSnapshot::from))
    }

    pub async fn order_by_id(&self, user: &str, order_id: &str) -> Result<Option<OrderRecord>> {
        validate_user_id(user)?;
        let table = format!("orders_{user}");
        let sql = format!(
            "SELECT order_id, ticker, side, price, size, status, created_at, updated_at
             FROM {table} WHERE order_id = $1"
        );
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(OrderRecord::from))
    }

    pub async fn fills(&self, user: &str) -> Result<Vec<FillRecord>> {
        validate_user_id(user)?;
        let table = format!("fills_{user}");
        let sql = format!(
            "SELECT trade_id, order_id, ticker, side, price, size, filled_at FROM {table}
             ORDER BY filled_at ASC"
        );
        let rows: Vec<FillRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(FillRecord::from).collect())
    }
}
