//! Kalshi order-placement client: the write-side counterpart to
//! `recaccount::client::AccountClient`'s read-only portfolio endpoints.
//!
//! Kept here rather than in `recaccount` because only TradeExecutor ever
//! places or flattens orders — AccountSync only reads portfolio state.
//! Same request shape as `AccountClient`: one struct holding a base URL and
//! a `reqwest::Client`, signed per-call via `recaccount::KalshiCredentials`.

use std::time::Duration;

use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use reccore::TradeSide;
use recaccount::{KalshiCredentials, KalshiEnv};

use crate::error::{ExecutorError, ExecutorResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// `buy` opens a position, `sell` flattens or reduces one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    Buy,
    Sell,
}

impl OrderAction {
    fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// `Limit` carries a resting price; `Market` crosses the book immediately,
/// used to flatten a position on close without waiting for a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Limit,
    Market,
}

impl OrderType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Limit => "limit",
            Self::Market => "market",
        }
    }
}

fn side_str(side: TradeSide) -> &'static str {
    match side {
        TradeSide::Yes => "yes",
        TradeSide::No => "no",
    }
}

/// Price in cents, 1-99, rounded from a `Price`'s 0-100 decimal scale.
fn price_cents(price: Decimal) -> i64 {
    price.round().to_i64().unwrap_or(0).clamp(1, 99)
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    ticker: &'a str,
    client_order_id: &'a str,
    side: &'a str,
    action: &'a str,
    count: i64,
    #[serde(rename = "type")]
    order_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    yes_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    no_price: Option<i64>,
}

/// The part of Kalshi's order-ack response TradeExecutor cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOrderAck {
    pub order_id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct CreateOrderResponse {
    order: RawOrderAck,
}

pub struct OrderClient {
    client: Client,
    base_url: String,
    credentials: KalshiCredentials,
}

impl OrderClient {
    pub fn new(env: KalshiEnv, credentials: KalshiCredentials) -> ExecutorResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ExecutorError::Transient(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: env.base_url().to_string(),
            credentials,
        })
    }

    /// Place an order. `client_order_id` is the idempotency key: a retried
    /// call with the same id against Kalshi is a no-op on their side.
    #[allow(clippy::too_many_arguments)]
    pub async fn place_order(
        &self,
        client_order_id: &str,
        ticker: &str,
        side: TradeSide,
        action: OrderAction,
        order_type: OrderType,
        price: Option<Decimal>,
        count: i64,
    ) -> ExecutorResult<RawOrderAck> {
        let path = "/portfolio/orders";
        let headers = self
            .credentials
            .sign("POST", path)
            .map_err(|e| ExecutorError::Transient(format!("signing failed: {e}")))?;

        let (yes_price, no_price) = match (order_type, side, price) {
            (OrderType::Limit, TradeSide::Yes, Some(p)) => (Some(price_cents(p)), None),
            (OrderType::Limit, TradeSide::No, Some(p)) => (None, Some(price_cents(p))),
            _ => (None, None),
        };

        let body = CreateOrderRequest {
            ticker,
            client_order_id,
            side: side_str(side),
            action: action.as_str(),
            count,
            order_type: order_type.as_str(),
            yes_price,
            no_price,
        };

        let url = format!("{}{path}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("KALSHI-ACCESS-KEY", headers.access_key)
            .header("KALSHI-ACCESS-SIGNATURE", headers.access_signature)
            .header("KALSHI-ACCESS-TIMESTAMP", headers.access_timestamp)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExecutorError::Transient(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExecutorError::from_status(status, body));
        }

        let parsed: CreateOrderResponse = response
            .json()
            .await
            .map_err(|e| ExecutorError::Transient(format!("failed to parse order response: {e}")))?;
        Ok(parsed.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_cents_rounds_and_clamps() {
        assert_eq!(price_cents(dec!(61.4)), 61);
        assert_eq!(price_cents(dec!(61.6)), 62);
        assert_eq!(price_cents(dec!(0)), 1);
        assert_eq!(price_cents(dec!(150)), 99);
    }

    #[test]
    fn test_side_str() {
        assert_eq!(side_str(TradeSide::Yes), "yes");
        assert_eq!(side_str(TradeSide::No), "no");
    }
}
