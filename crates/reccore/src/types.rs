//! Core domain entities: trades, live metrics, price ticks, preferences,
//! and supervised-service state.

use crate::market::EventTicker;
use crate::order::{EntryMethod, TicketId, TradeSide, TradeStatus};
use crate::Price;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A trade record, as persisted in `trades_<user>`.
///
/// Status transitions are enforced by [`TradeStatus::can_transition_to`];
/// this type never exposes a bare setter for `status` — use
/// [`Trade::transition_to`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Monotonic internal id, stable across restarts.
    pub id: u64,
    /// Exchange-side order/ticket identifier; idempotency key for
    /// TradeManager.
    pub ticket_id: TicketId,
    /// Underlying symbol, e.g. "BTC" or "ETH".
    pub symbol: String,
    /// Market ticker this trade's contract belongs to.
    pub contract: EventTicker,
    pub side: TradeSide,
    pub strike: Price,
    pub buy_price: Price,
    /// Number of contracts held (signed: positive for a standing position).
    pub position: i64,
    pub fees: Price,
    /// Entry probability, 0-100.
    pub prob: Decimal,
    /// Entry differential (modeled vs. market-implied probability).
    pub diff: Decimal,
    pub momentum: Decimal,
    /// Underlying symbol price at the moment of entry.
    pub symbol_open: Price,
    pub status: TradeStatus,
    pub entry_method: EntryMethod,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trade {
    /// Attempt the transition `self.status -> next`, validating against the
    /// lifecycle invariant. Returns `false` (no mutation) on an invalid edge.
    #[must_use]
    pub fn transition_to(&mut self, next: TradeStatus, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = now;
        true
    }
}

/// Live mirror of a non-terminal trade joined with up-to-the-tick metrics,
/// as persisted in `active_trades_<user>`.
///
/// Invariant: exactly one row exists per non-terminal [`Trade`]; the row is
/// removed the instant the trade reaches a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveTrade {
    pub trade_id: u64,
    pub current_symbol_price: Price,
    pub current_close_price: Price,
    pub buffer_from_strike: Price,
    pub time_since_entry: i64,
    pub ttc_seconds: i64,
    pub current_probability: Decimal,
    pub current_pnl: Price,
    pub last_updated: DateTime<Utc>,
}

/// One tick of a symbol's spot price log: `(timestamp PK, price)`.
///
/// Invariants enforced by the store, not this type: monotonic timestamps
/// per symbol via upsert-on-timestamp, and a 30-day EST rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    pub timestamp: DateTime<Utc>,
    pub price: Price,
}

/// Per-user trading preferences, mutated by the UI and read by ATS and
/// AutoEntryEngine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub user_id: String,
    pub auto_entry: bool,
    pub auto_stop: bool,
    pub position_size: i64,
    pub multiplier: i64,
    /// Entry floor, 0-100.
    pub min_probability: Decimal,
    /// Entry floor, percent.
    pub min_differential: Decimal,
    pub min_time_seconds: i64,
    pub max_time_seconds: i64,
    pub min_ttc_seconds: i64,
    pub allow_re_entry: bool,
    /// Auto-stop floor, 0-100 (`probability_floor` predicate).
    pub min_current_probability: Decimal,
    /// Auto-stop floor, seconds (`ttc_floor` predicate).
    pub min_current_ttc_seconds: i64,
    pub momentum_spike_enabled: bool,
    pub momentum_spike_threshold: Decimal,
    pub watchlist_min_volume: i64,
    pub watchlist_max_ask: Decimal,
    pub spike_alert_momentum_threshold: Decimal,
    pub spike_alert_cooldown_threshold: Decimal,
    pub spike_alert_cooldown_minutes: i64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            auto_entry: false,
            auto_stop: false,
            position_size: 1,
            multiplier: 1,
            min_probability: Decimal::from(95),
            min_differential: Decimal::new(25, 2),
            min_time_seconds: 120,
            max_time_seconds: 900,
            min_ttc_seconds: 60,
            allow_re_entry: false,
            min_current_probability: Decimal::from(40),
            min_current_ttc_seconds: 60,
            momentum_spike_enabled: false,
            momentum_spike_threshold: Decimal::from(5),
            watchlist_min_volume: 0,
            watchlist_max_ask: Decimal::from(100),
            spike_alert_momentum_threshold: Decimal::from(10),
            spike_alert_cooldown_threshold: Decimal::from(3),
            spike_alert_cooldown_minutes: 15,
        }
    }
}

/// Supervised-service run state, as tracked by the Supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ServiceStatus {
    Starting,
    Running,
    Stopped,
    Fatal,
    Restarting,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Starting => write!(f, "STARTING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Stopped => write!(f, "STOPPED"),
            Self::Fatal => write!(f, "FATAL"),
            Self::Restarting => write!(f, "RESTARTING"),
        }
    }
}

/// Point-in-time view of one supervised service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceState {
    pub name: String,
    pub pid: Option<u32>,
    pub status: ServiceStatus,
    pub restart_count: u32,
    pub last_exit_reason: Option<String>,
}

impl ServiceState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pid: None,
            status: ServiceStatus::Stopped,
            restart_count: 0,
            last_exit_reason: None,
        }
    }
}

/// A service's resolved `(host, port)` binding, sourced once from the port
/// manifest. No fallbacks: if a name is missing from the manifest, this
/// type is never constructed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAssignment {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl PortAssignment {
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
        }
    }

    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_trade() -> Trade {
        let now = Utc::now();
        Trade {
            id: 1,
            ticket_id: TicketId::new(),
            symbol: "BTC".to_string(),
            contract: EventTicker::new("KXBTCD-TEST"),
            side: TradeSide::Yes,
            strike: Price::new(dec!(107250)),
            buy_price: Price::new(dec!(61)),
            position: 1,
            fees: Price::ZERO,
            prob: dec!(96),
            diff: dec!(0.30),
            momentum: dec!(0),
            symbol_open: Price::new(dec!(107100)),
            status: TradeStatus::Pending,
            entry_method: EntryMethod::Auto,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_transition_forward_succeeds() {
        let mut t = sample_trade();
        assert!(t.transition_to(TradeStatus::Open, Utc::now()));
        assert_eq!(t.status, TradeStatus::Open);
    }

    #[test]
    fn test_transition_skip_is_rejected() {
        let mut t = sample_trade();
        assert!(!t.transition_to(TradeStatus::Closed, Utc::now()));
        assert_eq!(t.status, TradeStatus::Pending);
    }

    #[test]
    fn test_transition_reverse_is_rejected() {
        let mut t = sample_trade();
        assert!(t.transition_to(TradeStatus::Open, Utc::now()));
        assert!(!t.transition_to(TradeStatus::Pending, Utc::now()));
        assert_eq!(t.status, TradeStatus::Open);
    }

    #[test]
    fn test_port_assignment_socket_string() {
        let p = PortAssignment::new("trade_manager", "localhost", 4001);
        assert_eq!(p.socket_addr_string(), "localhost:4001");
    }

    #[test]
    fn test_preferences_default_matches_spec_floors() {
        let prefs = Preferences::default();
        assert_eq!(prefs.min_current_probability, Decimal::from(40));
        assert_eq!(prefs.min_current_ttc_seconds, 60);
    }

    #[test]
    fn test_service_state_new_is_stopped() {
        let s = ServiceState::new("trade_executor");
        assert_eq!(s.status, ServiceStatus::Stopped);
        assert_eq!(s.restart_count, 0);
    }
}
