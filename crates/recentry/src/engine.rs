//! AutoEntryEngine (spec.md §4.7): converts the watchlist, live market
//! snapshots, and preferences into entry intents delivered to
//! TradeManager.
//!
//! Per-tick shape mirrors `recats::supervisor::ActiveTradeSupervisor`:
//! a bounded worker pool (`futures_util::stream::buffer_unordered`)
//! evaluates every watched market concurrently, each evaluation is pure
//! read-then-maybe-call (no shared mutable state besides the two rolling
//! trackers), and a stale MarketFeed/PriceFeed suspends the engine
//! entirely — a stronger degraded-state response than ATS's, which only
//! suspends auto-stop (spec.md §5).

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use parking_lot::Mutex;
use reccore::{EntryIntent, EntryMethod, TradeSide};
use rust_decimal::prelude::ToPrimitive;
use recfeed::{MarketState, PriceFeedHandle, HEARTBEAT_STALE_MS};
use recrisk::auto_entry::{evaluate_scalar_gates, EntryRejectReason, SpikeCooldownTracker};
use recstore::Store;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, WatchedMarket};
use crate::error::EntryResult;
use crate::momentum::MomentumTracker;
use crate::open::EntryOpener;
use crate::volatility::VolatilityTracker;

/// How many markets are evaluated concurrently within one tick.
const TICK_CONCURRENCY: usize = 16;

/// Per-market deadline within a tick (spec.md §5): every external call
/// carries a deadline derived from this budget, and a market still
/// in-flight past it is cancelled and skipped for the tick rather than
/// allowed to overrun.
const DEFAULT_TICK_BUDGET: Duration = Duration::from_millis(800);

/// Run `fut` under the tick budget, returning `None` if it didn't finish
/// in time. Factored out so the timeout behavior is testable without a
/// full `AutoEntryEngine`.
async fn with_tick_budget<T>(fut: impl std::future::Future<Output = T>) -> Option<T> {
    tokio::time::timeout(DEFAULT_TICK_BUDGET, fut).await.ok()
}

/// A watched market that cleared every scalar gate this tick.
struct Candidate {
    market: WatchedMarket,
    intent: EntryIntent,
}

pub struct AutoEntryEngine {
    config: EngineConfig,
    store: Arc<Store>,
    market_state: MarketState,
    price_feeds: std::collections::HashMap<String, PriceFeedHandle>,
    opener: Arc<dyn EntryOpener>,
    momentum: Mutex<MomentumTracker>,
    volatility: Mutex<VolatilityTracker>,
    spike_cooldown: Mutex<SpikeCooldownTracker>,
}

impl AutoEntryEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<Store>,
        market_state: MarketState,
        price_feeds: std::collections::HashMap<String, PriceFeedHandle>,
        opener: Arc<dyn EntryOpener>,
    ) -> Self {
        Self {
            config,
            store,
            market_state,
            price_feeds,
            opener,
            momentum: Mutex::new(MomentumTracker::new()),
            volatility: Mutex::new(VolatilityTracker::new()),
            spike_cooldown: Mutex::new(SpikeCooldownTracker::new()),
        }
    }

    /// Run the generation loop until `token` fires. A tick still in
    /// progress when the next would fire is allowed to finish; the next
    /// tick is skipped rather than queued (spec.md §5).
    pub async fn run(&self, token: CancellationToken) {
        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!(user = %self.config.user, "AutoEntryEngine shutting down");
                    return;
                }
                _ = interval.tick() => {
                    if let Err(err) = self.tick().await {
                        warn!(user = %self.config.user, error = %err, "entry tick failed, retrying next tick");
                    }
                }
            }
        }
    }

    async fn tick(&self) -> EntryResult<()> {
        let now = Utc::now();

        if self.is_degraded(now) {
            debug!(user = %self.config.user, "entry tick suspended: market/price data stale");
            return Ok(());
        }

        let prefs = self.store.preferences.get(&self.config.user).await?;
        if !prefs.auto_entry {
            return Ok(());
        }

        self.record_spot_samples(now);

        let candidates: Vec<Option<Candidate>> = stream::iter(self.config.watchlist.clone())
            .map(|market| {
                let ticker = market.ticker.clone();
                async move {
                    match with_tick_budget(self.evaluate_market(market, &prefs, now)).await {
                        Some(candidate) => candidate,
                        None => {
                            warn!(
                                ticker = %ticker,
                                budget_ms = DEFAULT_TICK_BUDGET.as_millis() as u64,
                                "entry evaluation exceeded tick budget, skipping this tick"
                            );
                            None
                        }
                    }
                }
            })
            .buffer_unordered(TICK_CONCURRENCY)
            .collect()
            .await;

        for candidate in candidates.into_iter().flatten() {
            self.deliver(candidate).await;
        }
        Ok(())
    }

    /// Sample every watched symbol's current spot price into the rolling
    /// momentum/volatility trackers once per tick.
    fn record_spot_samples(&self, now: chrono::DateTime<Utc>) {
        let mut seen = std::collections::HashSet::new();
        for market in &self.config.watchlist {
            if !seen.insert(market.symbol.clone()) {
                continue;
            }
            if let Some(spot) = self.price_feeds.get(&market.symbol).and_then(|h| h.latest()) {
                self.momentum.lock().record(&market.symbol, spot.inner(), now);
                self.volatility.lock().record(&market.symbol, spot.inner(), now);
            }
        }
    }

    async fn evaluate_market(
        &self,
        market: WatchedMarket,
        prefs: &reccore::Preferences,
        now: chrono::DateTime<Utc>,
    ) -> Option<Candidate> {
        let snapshot = self.market_state.get(&reccore::market::EventTicker::new(market.ticker.clone()))?;
        if !snapshot.is_tradeable() {
            return None;
        }

        let spot = self
            .price_feeds
            .get(&market.symbol)
            .and_then(|h| h.latest())?;

        let daily_volatility = self.volatility.lock().daily_volatility(&market.symbol);
        let modeled_yes = crate::model::modeled_probability_yes(
            spot.inner(),
            snapshot.strike.inner(),
            snapshot.ttc_seconds(now),
            daily_volatility,
        );
        let market_implied_yes = snapshot.implied_probability_yes()?;

        let (side, modeled_side, market_side, ask, volume) = if modeled_yes >= market_implied_yes {
            (
                TradeSide::Yes,
                modeled_yes,
                market_implied_yes,
                snapshot.yes_ask,
                snapshot.yes_volume,
            )
        } else {
            let hundred = rust_decimal::Decimal::from(100);
            (
                TradeSide::No,
                hundred - modeled_yes,
                hundred - market_implied_yes,
                snapshot.no_ask,
                snapshot.no_volume,
            )
        };
        let differential = modeled_side - market_side;

        let momentum_delta = self
            .momentum
            .lock()
            .record(&market.symbol, spot.inner(), now)
            .unwrap_or(rust_decimal::Decimal::ZERO);

        if self
            .spike_cooldown
            .lock()
            .observe(&market.ticker, momentum_delta, prefs)
        {
            self.log_reject(&market, EntryRejectReason::SpikeCooldown);
            return None;
        }

        let has_terminal_trade_today = match self
            .store
            .trades
            .has_terminal_trade_since(
                &self.config.user,
                &market.ticker,
                reccore::est_time::start_of_est_day(now),
            )
            .await
        {
            Ok(has) => has,
            Err(err) => {
                warn!(ticker = %market.ticker, error = %err, "re-entry guard lookup failed, skipping market this tick");
                return None;
            }
        };

        let result = evaluate_scalar_gates(
            modeled_side,
            differential,
            snapshot.time_since_open_seconds(now),
            snapshot.ttc_seconds(now),
            volume.inner().to_i64().unwrap_or(i64::MAX),
            ask.inner(),
            has_terminal_trade_today,
            prefs,
        );

        match result {
            Ok(()) => {
                let size = prefs.position_size.saturating_mul(prefs.multiplier);
                let intent = EntryIntent {
                    symbol: market.symbol.clone(),
                    contract: snapshot.ticker.clone(),
                    side,
                    strike: snapshot.strike,
                    limit_price: ask,
                    size,
                    entry_method: EntryMethod::Auto,
                    prob: modeled_side,
                    diff: differential,
                    momentum: momentum_delta,
                    symbol_open: spot,
                    created_at: now,
                };
                Some(Candidate { market, intent })
            }
            Err(reason) => {
                self.log_reject(&market, reason);
                None
            }
        }
    }

    async fn deliver(&self, candidate: Candidate) {
        let ticker = candidate.market.ticker.clone();
        match self.opener.open_trade(candidate.intent).await {
            Ok(()) => info!(ticker = %ticker, "entry intent delivered"),
            Err(err) => warn!(ticker = %ticker, error = %err, "entry intent rejected by trade manager"),
        }
    }

    fn log_reject(&self, market: &WatchedMarket, reason: EntryRejectReason) {
        debug!(ticker = %market.ticker, reason = ?reason, "entry candidate rejected");
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
