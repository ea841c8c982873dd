//! HTTP client for Kalshi's portfolio endpoints.
//!
//! Modeled on `hip3-registry::client::MetaClient`: one client struct holding
//! a base URL and a `reqwest::Client`, one typed response struct per
//! endpoint, consistent error wrapping. The difference from the teacher's
//! shape is authentication — every request here carries the signed
//! headers from [`crate::auth::KalshiCredentials`] instead of going out as
//! an anonymous POST.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::auth::KalshiEnv;
use crate::error::{AccountError, AccountResult};
use crate::KalshiCredentials;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
pub struct RawOrder {
    pub order_id: String,
    pub ticker: String,
    pub side: String,
    pub price: Decimal,
    pub size: Decimal,
    pub status: String,
    pub created_time: DateTime<Utc>,
    pub updated_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<RawOrder>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawFill {
    pub trade_id: String,
    pub order_id: String,
    pub ticker: String,
    pub side: String,
    pub price: Decimal,
    pub size: Decimal,
    pub created_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct FillsResponse {
    pub fills: Vec<RawFill>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawPosition {
    pub ticker: String,
    pub side: String,
    pub quantity: i64,
    pub average_price: Decimal,
    pub updated_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct PositionsResponse {
    pub market_positions: Vec<RawPosition>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawSettlement {
    pub ticker: String,
    pub side: String,
    pub revenue: Decimal,
    pub settled_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct SettlementsResponse {
    pub settlements: Vec<RawSettlement>,
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BalanceResponse {
    pub balance: i64,
}

/// Portfolio-polling client for one user's Kalshi account.
pub struct AccountClient {
    client: Client,
    base_url: String,
    credentials: KalshiCredentials,
}

impl AccountClient {
    pub fn new(env: KalshiEnv, credentials: KalshiCredentials) -> AccountResult<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| AccountError::Http(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: env.base_url().to_string(),
            credentials,
        })
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> AccountResult<T> {
        let headers = self.credentials.sign("GET", path)?;
        let url = format!("{}{path}", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("KALSHI-ACCESS-KEY", headers.access_key)
            .header("KALSHI-ACCESS-SIGNATURE", headers.access_signature)
            .header("KALSHI-ACCESS-TIMESTAMP", headers.access_timestamp)
            .send()
            .await
            .map_err(|e| AccountError::Http(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AccountError::Http(format!("HTTP {status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| AccountError::Http(format!("failed to parse response: {e}")))
    }

    pub async fn fetch_orders(&self) -> AccountResult<OrdersResponse> {
        self.get("/portfolio/orders").await
    }

    pub async fn fetch_fills(&self) -> AccountResult<FillsResponse> {
        self.get("/portfolio/fills").await
    }

    pub async fn fetch_positions(&self) -> AccountResult<PositionsResponse> {
        self.get("/portfolio/positions").await
    }

    pub async fn fetch_settlements(&self) -> AccountResult<SettlementsResponse> {
        self.get("/portfolio/settlements").await
    }

    pub async fn fetch_balance(&self) -> AccountResult<BalanceResponse> {
        self.get("/portfolio/balance").await
    }
}
