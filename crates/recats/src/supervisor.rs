//! ActiveTradeSupervisor (spec.md §4.6) — the authoritative monitor for
//! every open trade and the enforcer of auto-stop.
//!
//! Canonical invariants upheld by this module:
//! - Exactly one ActiveTrade row per trade in `open`/`closing` status.
//! - Every such trade is evaluated at most once per tick, and never
//!   concurrently with itself (the `inflight` set below).
//! - Any auto-stop decision produces at most one close intent for a given
//!   trade across its lifetime (the same `inflight` set, held until the
//!   drain worker reports the intent delivered or rejected).
//!
//! Per-tick work fans out across trades with a bounded worker pool
//! (`futures_util::stream::buffer_unordered`), matching the teacher's
//! `hip3-position::tracker` preference for a single actor over per-trade
//! tasks; the close-intent drain is the one deliberately single-writer
//! piece, per spec.md's concurrency model.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashSet;
use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use reccore::{CloseIntent, Price, Trade, TradeStatus};
use recfeed::{MarketState, PriceFeedHandle, HEARTBEAT_STALE_MS};
use recstore::Store;
use recrisk::auto_stop;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AtsResult;
use crate::metrics::compute_active_trade;
use crate::momentum::MomentumTracker;
use crate::cache::ActiveTradeCache;

/// Tick cadence: 1 Hz, never lower than 0.5 Hz (spec.md §4.6).
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(2);

/// How many trades are evaluated concurrently within one tick.
const TICK_CONCURRENCY: usize = 16;

/// Per-trade deadline within a tick (spec.md §5): every external call
/// carries a deadline derived from this budget, and a trade still
/// in-flight past it is cancelled and skipped for the tick rather than
/// allowed to overrun.
const DEFAULT_TICK_BUDGET: Duration = Duration::from_millis(800);

/// Run `fut` under the tick budget, returning `None` if it didn't finish
/// in time.
async fn with_tick_budget<T>(fut: impl std::future::Future<Output = T>) -> Option<T> {
    tokio::time::timeout(DEFAULT_TICK_BUDGET, fut).await.ok()
}

pub struct ActiveTradeSupervisorConfig {
    pub user: String,
    pub tick_interval: Duration,
}

impl ActiveTradeSupervisorConfig {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// The authoritative ATS loop for one user.
pub struct ActiveTradeSupervisor {
    config: ActiveTradeSupervisorConfig,
    store: Arc<Store>,
    market_state: MarketState,
    price_feeds: std::collections::HashMap<String, PriceFeedHandle>,
    momentum: Mutex<MomentumTracker>,
    inflight: DashSet<u64>,
    known_trade_ids: Mutex<HashSet<u64>>,
    close_tx: mpsc::Sender<CloseIntent>,
    seq: AtomicU64,
    cache: ActiveTradeCache,
}

impl ActiveTradeSupervisor {
    pub fn new(
        config: ActiveTradeSupervisorConfig,
        store: Arc<Store>,
        market_state: MarketState,
        price_feeds: std::collections::HashMap<String, PriceFeedHandle>,
        close_tx: mpsc::Sender<CloseIntent>,
    ) -> Self {
        Self {
            config,
            store,
            market_state,
            price_feeds,
            momentum: Mutex::new(MomentumTracker::new()),
            inflight: DashSet::new(),
            known_trade_ids: Mutex::new(HashSet::new()),
            close_tx,
            seq: AtomicU64::new(0),
            cache: ActiveTradeCache::new(),
        }
    }

    /// Cloneable handle to the UI's short-TTL ActiveTrade read cache.
    pub fn cache(&self) -> ActiveTradeCache {
        self.cache.clone()
    }

    /// Run the monitoring loop until `token` fires. A tick still in
    /// progress when the next one would fire is allowed to finish; the next
    /// tick is skipped rather than queued (spec.md §5).
    pub async fn run(&self, token: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!(user = %self.config.user, "ActiveTradeSupervisor shutting down");
                    return;
                }
                _ = interval.tick() => {
                    if let Err(err) = self.tick().await {
                        warn!(user = %self.config.user, error = %err, "ATS tick failed, retrying next tick");
                    }
                }
            }
        }
    }

    async fn tick(&self) -> AtsResult<()> {
        let now = Utc::now();
        let prefs = self.store.preferences.get(&self.config.user).await?;

        let trades = self.store.trades.get_non_terminal(&self.config.user).await?;
        let monitored: Vec<Trade> = trades
            .into_iter()
            .filter(|t| matches!(t.status, TradeStatus::Open | TradeStatus::Closing))
            .collect();

        self.reap_closed_trades(&monitored).await?;

        let degraded = self.is_degraded(now);
        if degraded {
            debug!(user = %self.config.user, "ATS tick running in degraded mode: auto-stop suspended");
        }

        let rows: Vec<(u64, Option<auto_stop::AutoStopReason>)> = stream::iter(monitored)
            .map(|trade| {
                let trade_id = trade.id;
                async move {
                    match with_tick_budget(self.evaluate_trade(trade, &prefs, now, degraded)).await
                    {
                        Some((_, reason)) => (trade_id, reason),
                        None => {
                            warn!(
                                trade_id,
                                budget_ms = DEFAULT_TICK_BUDGET.as_millis() as u64,
                                "ATS trade evaluation exceeded tick budget, skipping this tick"
                            );
                            (trade_id, None)
                        }
                    }
                }
            })
            .buffer_unordered(TICK_CONCURRENCY)
            .collect()
            .await;

        for (trade_id, reason) in rows {
            if let Some(reason) = reason {
                self.enqueue_close(trade_id, reason).await;
            }
        }
        Ok(())
    }

    /// Compute and upsert one trade's ActiveTrade row, returning an
    /// auto-stop reason if a close intent should be raised.
    async fn evaluate_trade(
        &self,
        trade: Trade,
        prefs: &reccore::Preferences,
        now: chrono::DateTime<Utc>,
        degraded: bool,
    ) -> (Trade, Option<auto_stop::AutoStopReason>) {
        let spot = self
            .price_feeds
            .get(&trade.symbol)
            .and_then(|h| h.latest())
            .unwrap_or(Price::ZERO);
        let market = self.market_state.get(&trade.contract);

        let Some(market) = market else {
            // No snapshot yet for this market; metrics can't be computed
            // this tick, but that is not itself a reason to skip future
            // ticks — just best-effort skip.
            return (trade, None);
        };

        let row = compute_active_trade(&trade, &market, spot, now);
        if let Err(err) = self.store.active_trades.upsert(&self.config.user, &row).await {
            warn!(trade_id = trade.id, error = %err, "failed to upsert ActiveTrade row");
        }

        if degraded || trade.status != TradeStatus::Open || !prefs.auto_stop {
            return (trade, None);
        }

        let momentum_delta = if prefs.momentum_spike_enabled {
            self.momentum
                .lock()
                .record(trade.id, trade.side, row.current_probability, now)
        } else {
            None
        };

        let reason = auto_stop::evaluate(&row, prefs, momentum_delta);
        (trade, reason)
    }

    async fn enqueue_close(&self, trade_id: u64, reason: auto_stop::AutoStopReason) {
        if !self.inflight.insert(trade_id) {
            debug!(trade_id, "close intent already in flight, dropping duplicate");
            return;
        }

        let intent = CloseIntent::new(
            trade_id,
            self.seq.fetch_add(1, Ordering::SeqCst),
            Utc::now().timestamp_millis(),
        );

        info!(trade_id, reason = ?reason, "auto-stop triggered, enqueuing close intent");
        if self.close_tx.send(intent).await.is_err() {
            warn!(trade_id, "close-intent channel closed, dropping intent");
            self.inflight.remove(&trade_id);
        }
    }

    /// Remove ActiveTrade rows (and per-trade state) for trades that were
    /// monitored last tick but are no longer non-terminal.
    async fn reap_closed_trades(&self, monitored: &[Trade]) -> AtsResult<()> {
        let current: HashSet<u64> = monitored.iter().map(|t| t.id).collect();
        let removed: Vec<u64> = {
            let mut known = self.known_trade_ids.lock();
            let removed = known.difference(&current).copied().collect::<Vec<_>>();
            *known = current;
            removed
        };

        for trade_id in removed {
            self.store
                .active_trades
                .remove(&self.config.user, trade_id)
                .await?;
            self.momentum.lock().remove(trade_id);
            self.inflight.remove(&trade_id);
            debug!(trade_id, "trade reached terminal status, ActiveTrade row removed");
        }
        Ok(())
    }

    fn is_degraded(&self, now: chrono::DateTime<Utc>) -> bool {
        if self.market_state.is_stale(now, HEARTBEAT_STALE_MS) {
            return true;
        }
        self.price_feeds.values().any(|h| h.is_stale(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_interval_constants_within_spec_band() {
        assert_eq!(DEFAULT_TICK_INTERVAL, Duration::from_secs(1));
        assert!(MAX_TICK_INTERVAL <= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_budget_skips_slow_evaluation() {
        let slow = async {
            tokio::time::sleep(DEFAULT_TICK_BUDGET + Duration::from_millis(1)).await;
            "done"
        };
        assert_eq!(with_tick_budget(slow).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_budget_allows_fast_evaluation() {
        let fast = async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            "done"
        };
        assert_eq!(with_tick_budget(fast).await, Some("done"));
    }
}
