//! Prometheus metrics for REC.IO.
//!
//! Provides observability from Day 1 for:
//! - Feed connection state and heartbeat age (PriceFeed, MarketFeed)
//! - Entry signal detection (AutoEntryEngine)
//! - Risk gate blocks (shared ATS/AutoEntryEngine predicates)
//! - Trade execution (TradeManager/TradeExecutor)
//! - Rate limiting against Kalshi's API
//! - Restart orchestration (CascadingFailureDetector)
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. If registration fails,
//! it indicates a fatal configuration error (e.g., duplicate metric names)
//! that should cause an immediate crash at startup rather than silent failure.
//! These panics only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, register_histogram_vec,
    register_int_gauge, CounterVec, Gauge, GaugeVec, HistogramVec, IntGauge,
};

/// WebSocket connection state (1 = connected, 0 = disconnected).
pub static WS_CONNECTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "recws_connected",
        "WebSocket connection state (1=connected)"
    )
    .unwrap()
});

/// WebSocket state machine current state.
/// Labels: state (disconnected/connecting/connected/ready/reconnecting)
pub static WS_STATE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "recws_state",
        "WebSocket state machine current state (1=active, 0=inactive)",
        &["state"]
    )
    .unwrap()
});

/// Total WebSocket reconnection attempts.
pub static WS_RECONNECT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recws_reconnect_total",
        "Total WebSocket reconnection attempts",
        &["reason"]
    )
    .unwrap()
});

/// Feed message latency in milliseconds (Coinbase spot, Kalshi market feed).
pub static FEED_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "recfeed_latency_ms",
        "Feed message latency in milliseconds",
        &["channel"],
        vec![0.5, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0]
    )
    .unwrap()
});

/// Feed heartbeat age in milliseconds since the last message of any kind —
/// the watchdog signal the supervisor's health check reads.
pub static FEED_HEARTBEAT_AGE_MS: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "recfeed_heartbeat_age_ms",
        "Milliseconds since the feed's last heartbeat",
        &["feed"]
    )
    .unwrap()
});

/// Underlying price age in milliseconds since the last PriceFeed update.
pub static PRICE_AGE_MS: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "recfeed_price_age_ms",
        "Age of the last underlying price sample in milliseconds",
        &["symbol"]
    )
    .unwrap()
});

/// Kalshi yes/no spread in cents for a watched contract.
pub static SPREAD_CENTS: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "recfeed_spread_cents",
        "Current yes/no spread in cents",
        &["contract"]
    )
    .unwrap()
});

/// Total entry candidates triggered by AutoEntryEngine's model.
pub static ENTRY_TRIGGERS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recentry_triggers_total",
        "Total entry candidates triggered",
        &["contract", "side"]
    )
    .unwrap()
});

/// Differential (modeled vs. market-implied probability) distribution in
/// basis points at the moment an entry candidate is evaluated.
pub static DIFF_BPS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "recentry_diff_bps",
        "Modeled-vs-market probability differential in basis points",
        &["contract", "side"],
        vec![1.0, 2.0, 5.0, 10.0, 15.0, 20.0, 30.0, 50.0, 100.0]
    )
    .unwrap()
});

/// Risk gate block count (shared by AutoEntryEngine and ATS auto-stop
/// predicates — both sit on `recrisk`'s gate primitives).
pub static GATE_BLOCKED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recgate_blocked_total",
        "Total risk gate blocks",
        &["gate", "contract"]
    )
    .unwrap()
});

/// Risk gate block duration in milliseconds (recorded when block ends).
pub static GATE_BLOCK_DURATION_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "recgate_block_duration_ms",
        "Duration of continuous gate block periods in milliseconds",
        &["gate", "contract"],
        vec![10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0, 10000.0, 30000.0, 60000.0]
    )
    .unwrap()
});

/// Tick duration for the long-running supervisory loops (ATS, AutoEntryEngine,
/// CascadingFailureDetector) in milliseconds.
pub static TICK_DURATION_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "rectick_duration_ms",
        "Duration of one supervisory tick in milliseconds",
        &["loop_name"],
        vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0]
    )
    .unwrap()
});

/// Total close intents enqueued by ATS auto-stop predicates.
pub static CLOSE_INTENT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recats_close_intent_total",
        "Total close intents enqueued",
        &["reason"]
    )
    .unwrap()
});

/// Total process restarts ordered by CascadingFailureDetector's
/// MASTER_RESTART orchestration.
pub static RESTART_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "reccfd_restart_total",
        "Total restarts ordered by the cascading failure detector",
        &["component"]
    )
    .unwrap()
});

// =============================================================================
// Rate limiting (Kalshi API / order submission)
// =============================================================================

/// Total WebSocket messages sent by type.
/// Labels: kind (subscribe/unsubscribe/ping)
pub static WS_MSGS_SENT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recws_msgs_sent_total",
        "Total WebSocket messages sent by type",
        &["kind"]
    )
    .unwrap()
});

/// Total WebSocket messages blocked by reason.
/// Labels: reason (rate_limit/inflight_full/circuit_open), kind
pub static WS_MSGS_BLOCKED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recws_msgs_blocked_total",
        "Total WebSocket messages blocked by rate limiting",
        &["reason", "kind"]
    )
    .unwrap()
});

/// Current number of inflight order submissions to Kalshi.
pub static ORDER_INFLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "rectrade_order_inflight",
        "Current number of inflight order submissions"
    )
    .unwrap()
});

/// Total orders rejected by reason.
/// Labels: reason (rate_limit/permanent_error/retry_budget_exhausted)
pub static ORDER_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "rectrade_order_rejected_total",
        "Total order submissions rejected",
        &["reason"]
    )
    .unwrap()
});

/// Circuit breaker state for order submission (1=open, 0=closed).
pub static ORDER_CIRCUIT_OPEN: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "rectrade_order_circuit_open",
        "Circuit breaker state for order submission (1=open, 0=closed)"
    )
    .unwrap()
});

/// Total Kalshi API rate-limit hits.
pub static RATE_LIMIT_HIT_TOTAL: Lazy<prometheus::IntCounter> = Lazy::new(|| {
    prometheus::register_int_counter!(
        "reckalshi_rate_limit_hit_total",
        "Total Kalshi API rate limit hits"
    )
    .unwrap()
});

// =============================================================================
// Trade PnL & position observability
// =============================================================================

/// Trade PnL in basis points per closed position.
/// Labels: contract, exit_reason (AutoStop/ManualClose/TimeStop/Unknown)
pub static TRADE_PNL_BPS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "rectrade_pnl_bps",
        "Trade PnL in basis points per closed position",
        &["contract", "exit_reason"],
        vec![
            -100.0, -50.0, -30.0, -20.0, -10.0, -5.0, 0.0, 5.0, 10.0, 20.0, 30.0, 50.0, 100.0,
            200.0,
        ]
    )
    .unwrap()
});

/// Position holding time in milliseconds.
pub static POSITION_HOLDING_TIME_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "recats_holding_time_ms",
        "Position holding time in milliseconds",
        &["contract", "exit_reason"],
        vec![100.0, 500.0, 1000.0, 2000.0, 5000.0, 10000.0, 15000.0, 20000.0, 30000.0, 60000.0,]
    )
    .unwrap()
});

/// Entry differential in basis points at signal detection time (same
/// quantity as [`DIFF_BPS`], recorded again per-entry for PnL correlation).
pub static ENTRY_EDGE_BPS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "recentry_edge_bps",
        "Entry differential in basis points at signal detection time",
        &["contract"],
        vec![5.0, 10.0, 15.0, 20.0, 30.0, 40.0, 50.0, 75.0, 100.0, 150.0, 200.0]
    )
    .unwrap()
});

/// Latency from signal detection to order submission in milliseconds.
pub static SIGNAL_TO_ORDER_LATENCY_MS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "rectrade_signal_to_order_latency_ms",
        "Latency from signal detection to order submission in milliseconds",
        &["contract"],
        vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record WebSocket connected.
    pub fn ws_connected() {
        WS_CONNECTED.set(1.0);
    }

    /// Record WebSocket disconnected.
    pub fn ws_disconnected() {
        WS_CONNECTED.set(0.0);
    }

    /// Set WebSocket state machine state.
    /// Only the active state should be set to 1, all others to 0.
    pub fn ws_state_set(state: &str) {
        for s in &[
            "disconnected",
            "connecting",
            "connected",
            "ready",
            "reconnecting",
        ] {
            WS_STATE.with_label_values(&[s]).set(0.0);
        }
        WS_STATE.with_label_values(&[state]).set(1.0);
    }

    /// Record WebSocket reconnection.
    pub fn ws_reconnect(reason: &str) {
        WS_RECONNECT_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record feed latency.
    pub fn feed_latency(channel: &str, latency_ms: f64) {
        FEED_LATENCY_MS
            .with_label_values(&[channel])
            .observe(latency_ms);
    }

    /// Update a feed's heartbeat age.
    pub fn feed_heartbeat_age(feed: &str, age_ms: f64) {
        FEED_HEARTBEAT_AGE_MS.with_label_values(&[feed]).set(age_ms);
    }

    /// Update underlying price age.
    pub fn price_age(symbol: &str, age_ms: f64) {
        PRICE_AGE_MS.with_label_values(&[symbol]).set(age_ms);
    }

    /// Update Kalshi yes/no spread.
    pub fn spread_cents(contract: &str, cents: f64) {
        SPREAD_CENTS.with_label_values(&[contract]).set(cents);
    }

    /// Record an entry candidate triggered.
    pub fn entry_triggered(contract: &str, side: &str) {
        ENTRY_TRIGGERS_TOTAL.with_label_values(&[contract, side]).inc();
    }

    /// Record a differential observation.
    pub fn diff_observed(contract: &str, side: &str, diff_bps: f64) {
        DIFF_BPS.with_label_values(&[contract, side]).observe(diff_bps);
    }

    /// Record risk gate block.
    pub fn gate_blocked(gate: &str, contract: &str) {
        GATE_BLOCKED_TOTAL.with_label_values(&[gate, contract]).inc();
    }

    /// Record gate block duration when block period ends.
    pub fn gate_block_duration(gate: &str, contract: &str, duration_ms: f64) {
        GATE_BLOCK_DURATION_MS
            .with_label_values(&[gate, contract])
            .observe(duration_ms);
    }

    /// Record one supervisory tick's duration.
    pub fn tick_duration(loop_name: &str, duration_ms: f64) {
        TICK_DURATION_MS
            .with_label_values(&[loop_name])
            .observe(duration_ms);
    }

    /// Record a close intent enqueued.
    pub fn close_intent(reason: &str) {
        CLOSE_INTENT_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a restart ordered by the cascading failure detector.
    pub fn restart(component: &str) {
        RESTART_TOTAL.with_label_values(&[component]).inc();
    }

    // =========================================================================
    // Rate limiting
    // =========================================================================

    /// Record WebSocket message sent.
    pub fn ws_msg_sent(kind: &str) {
        WS_MSGS_SENT_TOTAL.with_label_values(&[kind]).inc();
    }

    /// Record WebSocket message blocked.
    pub fn ws_msg_blocked(reason: &str, kind: &str) {
        WS_MSGS_BLOCKED_TOTAL.with_label_values(&[reason, kind]).inc();
    }

    /// Update inflight order count.
    pub fn order_inflight_set(count: i64) {
        ORDER_INFLIGHT.set(count);
    }

    /// Increment inflight order count.
    pub fn order_inflight_inc() {
        ORDER_INFLIGHT.inc();
    }

    /// Decrement inflight order count.
    pub fn order_inflight_dec() {
        ORDER_INFLIGHT.dec();
    }

    /// Record order rejected.
    pub fn order_rejected(reason: &str) {
        ORDER_REJECTED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Set order-submission circuit breaker state.
    pub fn order_circuit_open(is_open: bool) {
        ORDER_CIRCUIT_OPEN.set(if is_open { 1 } else { 0 });
    }

    /// Record a Kalshi API rate limit hit.
    pub fn rate_limit_hit() {
        RATE_LIMIT_HIT_TOTAL.inc();
    }

    // =========================================================================
    // Trade PnL & position observability
    // =========================================================================

    /// Record trade PnL in basis points.
    pub fn trade_pnl(contract: &str, exit_reason: &str, pnl_bps: f64) {
        TRADE_PNL_BPS
            .with_label_values(&[contract, exit_reason])
            .observe(pnl_bps);
    }

    /// Record position holding time in milliseconds.
    pub fn position_holding_time(contract: &str, exit_reason: &str, holding_ms: f64) {
        POSITION_HOLDING_TIME_MS
            .with_label_values(&[contract, exit_reason])
            .observe(holding_ms);
    }

    /// Record entry edge in basis points.
    pub fn entry_edge(contract: &str, edge_bps: f64) {
        ENTRY_EDGE_BPS.with_label_values(&[contract]).observe(edge_bps);
    }

    /// Record signal-to-order latency in milliseconds.
    pub fn signal_to_order_latency(contract: &str, latency_ms: f64) {
        SIGNAL_TO_ORDER_LATENCY_MS
            .with_label_values(&[contract])
            .observe(latency_ms);
    }
}
