//! Exchange account mirror: positions, fills, orders, settlements, balance.
//!
//! Every row here is owned exclusively by AccountSync, which upserts by the
//! exchange's own identifiers (`order_id`, `trade_id`, ...) as natural keys
//! and never deletes a row — a settlement or cancellation is a status
//! update, not a removal.

use crate::{EventTicker, Price, Size, TradeSide};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A resting or filled order as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Exchange-assigned order id; the natural key for upserts.
    pub order_id: String,
    pub ticker: EventTicker,
    pub side: TradeSide,
    pub price: Price,
    pub size: Size,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Resting,
    Filled,
    Canceled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resting => write!(f, "resting"),
            Self::Filled => write!(f, "filled"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

/// A single fill against an order, as reported by the exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillRecord {
    /// Exchange-assigned trade id; the natural key for upserts.
    pub trade_id: String,
    pub order_id: String,
    pub ticker: EventTicker,
    pub side: TradeSide,
    pub price: Price,
    pub size: Size,
    pub filled_at: DateTime<Utc>,
}

/// A standing position in one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub ticker: EventTicker,
    pub side: TradeSide,
    pub quantity: i64,
    pub average_price: Price,
    pub updated_at: DateTime<Utc>,
}

/// A finalized market result affecting the account's balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub ticker: EventTicker,
    pub side: TradeSide,
    pub revenue: Price,
    pub settled_at: DateTime<Utc>,
}

/// Point-in-time account balance snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub available_balance: Price,
    pub as_of: DateTime<Utc>,
}
