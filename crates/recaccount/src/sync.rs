//! AccountSync (spec.md §4.5): cadence-driven reconciliation of positions,
//! fills, orders, settlements and balance from Kalshi into the Store.
//!
//! Upserts key on the exchange's own identifiers and never delete a row;
//! `recstore::account::AccountTables` already fans out `db_change` after
//! each commit, so this loop only needs to call the right upsert.

use std::sync::Arc;
use std::time::Duration;

use reccore::{
    BalanceSnapshot, EventTicker, FillRecord, OrderRecord, OrderStatus, Price, PositionRecord,
    SettlementRecord, Size, TradeSide,
};
use recstore::Store;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::client::{AccountClient, RawFill, RawOrder, RawPosition, RawSettlement};
use crate::error::AccountResult;

/// Default poll cadence: within the 5-15 s range spec.md §4.5 specifies.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

fn parse_side(s: &str) -> TradeSide {
    if s.eq_ignore_ascii_case("no") {
        TradeSide::No
    } else {
        TradeSide::Yes
    }
}

fn parse_order_status(s: &str) -> OrderStatus {
    match s.to_ascii_lowercase().as_str() {
        "resting" | "open" => OrderStatus::Resting,
        "canceled" | "cancelled" => OrderStatus::Canceled,
        _ => OrderStatus::Filled,
    }
}

impl From<RawOrder> for OrderRecord {
    fn from(raw: RawOrder) -> Self {
        OrderRecord {
            order_id: raw.order_id,
            ticker: EventTicker::new(raw.ticker),
            side: parse_side(&raw.side),
            price: Price::new(raw.price),
            size: Size::new(raw.size),
            status: parse_order_status(&raw.status),
            created_at: raw.created_time,
            updated_at: raw.updated_time,
        }
    }
}

impl From<RawFill> for FillRecord {
    fn from(raw: RawFill) -> Self {
        FillRecord {
            trade_id: raw.trade_id,
            order_id: raw.order_id,
            ticker: EventTicker::new(raw.ticker),
            side: parse_side(&raw.side),
            price: Price::new(raw.price),
            size: Size::new(raw.size),
            filled_at: raw.created_time,
        }
    }
}

impl From<RawPosition> for PositionRecord {
    fn from(raw: RawPosition) -> Self {
        PositionRecord {
            ticker: EventTicker::new(raw.ticker),
            side: parse_side(&raw.side),
            quantity: raw.quantity,
            average_price: Price::new(raw.average_price),
            updated_at: raw.updated_time,
        }
    }
}

impl From<RawSettlement> for SettlementRecord {
    fn from(raw: RawSettlement) -> Self {
        SettlementRecord {
            ticker: EventTicker::new(raw.ticker),
            side: parse_side(&raw.side),
            revenue: Price::new(raw.revenue),
            settled_at: raw.settled_time,
        }
    }
}

/// Drives one user's account reconciliation loop.
pub struct AccountSync {
    client: AccountClient,
    store: Arc<Store>,
    user: String,
    poll_interval: Duration,
}

impl AccountSync {
    pub fn new(client: AccountClient, store: Arc<Store>, user: impl Into<String>) -> Self {
        Self {
            client,
            store,
            user: user.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Run the reconciliation loop until cancelled. A failed cadence is
    /// logged and retried next tick — never fatal, matching PriceFeed's
    /// failure semantics (spec.md §4.3/§4.5).
    pub async fn run(&self, token: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!(user = %self.user, "AccountSync shutting down");
                    return;
                }
                _ = interval.tick() => {
                    if let Err(err) = self.sync_once().await {
                        warn!(user = %self.user, error = %err, "account sync cadence failed, retrying next tick");
                    }
                }
            }
        }
    }

    /// One full reconciliation pass across all five account facets.
    pub async fn sync_once(&self) -> AccountResult<()> {
        self.sync_orders().await?;
        self.sync_fills().await?;
        self.sync_positions().await?;
        self.sync_settlements().await?;
        self.sync_balance().await?;
        Ok(())
    }

    async fn sync_orders(&self) -> AccountResult<()> {
        let response = self.client.fetch_orders().await?;
        for raw in response.orders {
            let record: OrderRecord = raw.into();
            self.store.account.upsert_order(&self.user, &record).await?;
        }
        Ok(())
    }

    async fn sync_fills(&self) -> AccountResult<()> {
        let response = self.client.fetch_fills().await?;
        for raw in response.fills {
            let record: FillRecord = raw.into();
            self.store.account.upsert_fill(&self.user, &record).await?;
        }
        Ok(())
    }

    async fn sync_positions(&self) -> AccountResult<()> {
        let response = self.client.fetch_positions().await?;
        for raw in response.market_positions {
            let record: PositionRecord = raw.into();
            self.store
                .account
                .upsert_position(&self.user, &record)
                .await?;
        }
        Ok(())
    }

    async fn sync_settlements(&self) -> AccountResult<()> {
        let response = self.client.fetch_settlements().await?;
        for raw in response.settlements {
            let record: SettlementRecord = raw.into();
            self.store
                .account
                .insert_settlement(&self.user, &record)
                .await?;
        }
        Ok(())
    }

    async fn sync_balance(&self) -> AccountResult<()> {
        let response = self.client.fetch_balance().await?;
        // Kalshi reports balance in integer cents.
        let snapshot = BalanceSnapshot {
            available_balance: Price::new(rust_decimal::Decimal::new(response.balance, 2)),
            as_of: chrono::Utc::now(),
        };
        self.store.account.record_balance(&self.user, &snapshot).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_side_case_insensitive() {
        assert_eq!(parse_side("no"), TradeSide::No);
        assert_eq!(parse_side("NO"), TradeSide::No);
        assert_eq!(parse_side("yes"), TradeSide::Yes);
        assert_eq!(parse_side("anything_else"), TradeSide::Yes);
    }

    #[test]
    fn test_parse_order_status() {
        assert_eq!(parse_order_status("resting"), OrderStatus::Resting);
        assert_eq!(parse_order_status("canceled"), OrderStatus::Canceled);
        assert_eq!(parse_order_status("cancelled"), OrderStatus::Canceled);
        assert_eq!(parse_order_status("executed"), OrderStatus::Filled);
    }
}
