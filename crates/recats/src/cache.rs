//! Short-TTL read cache for the UI's ActiveTrade view.
//!
//! The supervisor upserts every ActiveTrade row to the store each tick
//! anyway; a UI polling faster than 1 Hz would otherwise hit Postgres on
//! every request for data that is, at best, a tick old. This cache holds
//! the last full snapshot for ~2s so repeated reads inside one tick window
//! are free, without ever serving data older than the invariant allows.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use reccore::ActiveTrade;

const DEFAULT_TTL: Duration = Duration::from_secs(2);

struct Entry {
    rows: Arc<Vec<ActiveTrade>>,
    cached_at: Instant,
}

/// Cloneable handle to the supervisor's latest ActiveTrade snapshot.
#[derive(Clone)]
pub struct ActiveTradeCache {
    inner: Arc<RwLock<Option<Entry>>>,
    ttl: Duration,
}

impl ActiveTradeCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            ttl,
        }
    }

    /// Replace the cached snapshot. Called by the supervisor once per tick,
    /// after every trade's ActiveTrade row has been computed.
    pub fn publish(&self, rows: Vec<ActiveTrade>) {
        let mut guard = self.inner.write();
        *guard = Some(Entry {
            rows: Arc::new(rows),
            cached_at: Instant::now(),
        });
    }

    /// Return the cached snapshot if it is still within the TTL, `None` if
    /// it has never been published or has gone stale.
    pub fn read_fresh(&self) -> Option<Arc<Vec<ActiveTrade>>> {
        let guard = self.inner.read();
        let entry = guard.as_ref()?;
        if entry.cached_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.rows.clone())
    }
}

impl Default for ActiveTradeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reccore::Price;
    use rust_decimal_macros::dec;
    use std::thread::sleep;

    fn sample_row(trade_id: u64) -> ActiveTrade {
        ActiveTrade {
            trade_id,
            current_symbol_price: Price::new(dec!(107300)),
            current_close_price: Price::new(dec!(61)),
            buffer_from_strike: Price::new(dec!(50)),
            time_since_entry: 30,
            ttc_seconds: 900,
            current_probability: dec!(61),
            current_pnl: Price::ZERO,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_empty_cache_reads_none() {
        let cache = ActiveTradeCache::new();
        assert!(cache.read_fresh().is_none());
    }

    #[test]
    fn test_published_snapshot_is_readable() {
        let cache = ActiveTradeCache::new();
        cache.publish(vec![sample_row(1)]);
        let rows = cache.read_fresh().expect("should be fresh");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trade_id, 1);
    }

    #[test]
    fn test_expired_snapshot_reads_none() {
        let cache = ActiveTradeCache::with_ttl(Duration::from_millis(10));
        cache.publish(vec![sample_row(1)]);
        sleep(Duration::from_millis(30));
        assert!(cache.read_fresh().is_none());
    }
}
