//! One instance per underlying symbol (BTC, ETH): a 1 Hz watchdog that
//! fetches the Coinbase spot price, upserts it into `recstore`'s price
//! log, and relies on the store's own rolling delete to enforce the
//! 30-day EST window. Modeled on `hip3-feed`'s polling/update cadence and
//! `recws::heartbeat` for liveness.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reccore::est_time::now_rounded_to_second;
use reccore::{Price, PriceTick};
use recstore::Store;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Staleness threshold for a symbol's spot price, per spec.md §4.6/§5.
pub const PRICE_STALE_MS: i64 = 5_000;

#[derive(Debug, Deserialize)]
struct CoinbaseSpotResponse {
    data: CoinbaseSpotData,
}

#[derive(Debug, Deserialize)]
struct CoinbaseSpotData {
    amount: Decimal,
}

fn spot_url(symbol: &str) -> String {
    format!("https://api.coinbase.com/v2/prices/{symbol}-USD/spot")
}

/// Cadence watchdog for one symbol's spot price.
pub struct PriceFeed {
    symbol: String,
    http: reqwest::Client,
    store: Arc<Store>,
    last_price: watch::Sender<Option<Price>>,
    last_update_ms: Arc<AtomicI64>,
}

/// Cloneable read handle to one symbol's latest spot price and its
/// freshness, shared with ATS for the §4.6 spot-price cache read and
/// degraded-state check.
#[derive(Clone)]
pub struct PriceFeedHandle {
    watch: watch::Receiver<Option<Price>>,
    last_update_ms: Arc<AtomicI64>,
}

impl PriceFeedHandle {
    pub fn latest(&self) -> Option<Price> {
        *self.watch.borrow()
    }

    /// Age of the last successful fetch, in milliseconds. `None` before the
    /// first fetch completes.
    pub fn age_ms(&self, now: DateTime<Utc>) -> Option<i64> {
        let last = self.last_update_ms.load(Ordering::Relaxed);
        if last == 0 {
            None
        } else {
            Some(now.timestamp_millis() - last)
        }
    }

    /// True once this symbol's feed has gone stale per spec.md's 5s
    /// threshold (or never produced a price at all).
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.age_ms(now) {
            Some(age) => age > PRICE_STALE_MS,
            None => true,
        }
    }
}

impl PriceFeed {
    pub fn new(symbol: impl Into<String>, store: Arc<Store>) -> Self {
        let (last_price, _) = watch::channel(None);
        Self {
            symbol: symbol.into(),
            http: reqwest::Client::new(),
            store,
            last_price,
            last_update_ms: Arc::new(AtomicI64::new(0)),
        }
    }

    /// The last successfully fetched price, for ATS's spot-price cache
    /// read; `None` until the first successful fetch.
    pub fn watch(&self) -> watch::Receiver<Option<Price>> {
        self.last_price.subscribe()
    }

    /// Cloneable handle exposing both the latest price and its freshness.
    pub fn handle(&self) -> PriceFeedHandle {
        PriceFeedHandle {
            watch: self.last_price.subscribe(),
            last_update_ms: self.last_update_ms.clone(),
        }
    }

    /// Run the 1 Hz fetch loop until `token` is cancelled. A fetch error is
    /// logged and retried next cadence — it never aborts the loop.
    pub async fn run(&self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!(symbol = %self.symbol, "price feed shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.fetch_and_record().await {
                        warn!(symbol = %self.symbol, error = %err, "price fetch failed, retrying next tick");
                    }
                }
            }
        }
    }

    async fn fetch_and_record(&self) -> crate::error::FeedResult<()> {
        let resp: CoinbaseSpotResponse = self
            .http
            .get(spot_url(&self.symbol))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let price = Price::new(resp.data.amount);
        let tick = PriceTick {
            timestamp: now_rounded_to_second(),
            price,
        };

        self.store.price_log.record(&self.symbol, tick).await?;
        let _ = self.last_price.send(Some(price));
        self.last_update_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
        debug!(symbol = %self.symbol, %price.0, "recorded price tick");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spot_url_shape() {
        assert_eq!(
            spot_url("BTC"),
            "https://api.coinbase.com/v2/prices/BTC-USD/spot"
        );
    }
}
