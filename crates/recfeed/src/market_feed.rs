//! Dual-mode market data feed: WEBSOCKET (preferred) applies `ticker_v2`
//! deltas to an in-memory snapshot; HTTP_POLL (fallback) re-fetches and
//! overwrites the full market list on a ~1s cadence. WebSocket mode reuses
//! [`recws::ConnectionManager`] almost directly; HTTP_POLL mirrors
//! `hip3-feed::market_state`'s polling path.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reccore::market::{EventTicker, MarketSnapshot, MarketStatus};
use reccore::{Price, Size};
use recws::{ConnectionConfig, ConnectionManager, WsMessage};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::error::FeedResult;
use crate::market_state::MarketState;

/// Feed heartbeat staleness threshold, per spec.md §4.4/§4.6.
pub const HEARTBEAT_STALE_MS: i64 = 10_000;

#[derive(Debug, Clone)]
pub struct MarketFeedConfig {
    pub ws_url: String,
    pub http_list_url: String,
    pub market_tickers: Vec<String>,
    pub use_websocket: bool,
    pub fallback_to_http: bool,
    pub max_retries: u32,
    pub http_poll_interval: Duration,
}

impl Default for MarketFeedConfig {
    fn default() -> Self {
        Self {
            ws_url: String::new(),
            http_list_url: String::new(),
            market_tickers: Vec::new(),
            use_websocket: true,
            fallback_to_http: true,
            max_retries: 3,
            http_poll_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MarketListResponse {
    markets: Vec<MarketListing>,
}

#[derive(Debug, Deserialize)]
struct MarketListing {
    ticker: String,
    #[serde(default)]
    floor_strike: Option<Decimal>,
    yes_bid: Decimal,
    yes_ask: Decimal,
    no_bid: Decimal,
    no_ask: Decimal,
    #[serde(default)]
    volume: i64,
    #[serde(default)]
    tick_size: Option<Decimal>,
    close_time: DateTime<Utc>,
    #[serde(default)]
    open_time: Option<DateTime<Utc>>,
    status: String,
}

fn parse_status(s: &str) -> MarketStatus {
    match s {
        "closed" => MarketStatus::Closed,
        "settled" | "finalized" => MarketStatus::Settled,
        _ => MarketStatus::Open,
    }
}

impl From<MarketListing> for MarketSnapshot {
    fn from(m: MarketListing) -> Self {
        MarketSnapshot {
            ticker: EventTicker::new(m.ticker),
            strike: Price::new(m.floor_strike.unwrap_or_default()),
            yes_bid: Price::new(m.yes_bid),
            yes_ask: Price::new(m.yes_ask),
            no_bid: Price::new(m.no_bid),
            no_ask: Price::new(m.no_ask),
            yes_volume: Size::new(Decimal::from(m.volume)),
            no_volume: Size::ZERO,
            status: parse_status(&m.status),
            tier_spacing: Price::new(m.tick_size.unwrap_or_default()),
            close_time: m.close_time,
            open_time: m.open_time.unwrap_or_else(Utc::now),
            received_at: Utc::now(),
        }
    }
}

/// Dual-mode market data feed.
pub struct MarketFeed {
    config: MarketFeedConfig,
    state: MarketState,
    http: reqwest::Client,
}

impl MarketFeed {
    pub fn new(config: MarketFeedConfig) -> Self {
        Self {
            config,
            state: MarketState::new(),
            http: reqwest::Client::new(),
        }
    }

    /// Shared handle to the live snapshot cache — the thing ATS and
    /// AutoEntryEngine actually read from.
    pub fn state(&self) -> MarketState {
        self.state.clone()
    }

    pub async fn run(&self, token: CancellationToken) {
        if self.config.use_websocket {
            if let Err(err) = self.run_websocket(token.clone()).await {
                error!(error = %err, "websocket market feed exhausted retries");
                if self.config.fallback_to_http {
                    warn!("falling back to HTTP_POLL market feed");
                    self.run_http_poll(token).await;
                }
            }
        } else {
            self.run_http_poll(token).await;
        }
    }

    async fn run_websocket(&self, token: CancellationToken) -> FeedResult<()> {
        let (tx, mut rx) = mpsc::channel(1024);
        let conn = Arc::new(ConnectionManager::new(
            ConnectionConfig {
                url: self.config.ws_url.clone(),
                max_reconnect_attempts: self.config.max_retries,
                market_tickers: self.config.market_tickers.clone(),
                ..Default::default()
            },
            tx,
        ));

        let conn_task = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.connect().await })
        };

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    conn_task.abort();
                    return Ok(());
                }
                msg = rx.recv() => {
                    match msg {
                        Some(WsMessage::TickerV2(delta)) => self.apply_delta(delta),
                        Some(_) => {}
                        None => break,
                    }
                }
            }
        }

        match conn_task.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(err.into()),
            Err(join_err) => {
                error!(error = %join_err, "websocket task panicked");
                Ok(())
            }
        }
    }

    fn apply_delta(&self, delta: recws::message::TickerV2Message) {
        let ticker = EventTicker::new(delta.market_ticker.clone());
        let now = Utc::now();
        let mut snapshot = self.state.get(&ticker).unwrap_or_else(|| MarketSnapshot {
            ticker: ticker.clone(),
            strike: Price::ZERO,
            yes_bid: Price::ZERO,
            yes_ask: Price::ZERO,
            no_bid: Price::ZERO,
            no_ask: Price::ZERO,
            yes_volume: Size::ZERO,
            no_volume: Size::ZERO,
            status: MarketStatus::Open,
            tier_spacing: Price::ZERO,
            close_time: now + chrono::Duration::days(1),
            open_time: now,
            received_at: now,
        });

        if let Some(yes_bid) = delta.yes_bid {
            snapshot.yes_bid = Price::new(yes_bid);
            snapshot.no_ask = Price::new(Decimal::from(100) - yes_bid);
        }
        if let Some(yes_ask) = delta.yes_ask {
            snapshot.yes_ask = Price::new(yes_ask);
            snapshot.no_bid = Price::new(Decimal::from(100) - yes_ask);
        }
        if let Some(volume) = delta.volume {
            snapshot.yes_volume = Size::new(Decimal::from(volume));
        }
        snapshot.received_at = now;

        self.state.update(snapshot);
    }

    async fn run_http_poll(&self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.http_poll_interval);
        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = ticker.tick() => {
                    if let Err(err) = self.poll_once().await {
                        warn!(error = %err, "market list poll failed, retrying next tick");
                    }
                }
            }
        }
    }

    async fn poll_once(&self) -> FeedResult<()> {
        let resp: MarketListResponse = self
            .http
            .get(&self.config.http_list_url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        for listing in resp.markets {
            self.state.update(MarketSnapshot::from(listing));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_defaults_to_open() {
        assert_eq!(parse_status("open"), MarketStatus::Open);
        assert_eq!(parse_status("closed"), MarketStatus::Closed);
        assert_eq!(parse_status("settled"), MarketStatus::Settled);
        assert_eq!(parse_status("weird"), MarketStatus::Open);
    }
}
