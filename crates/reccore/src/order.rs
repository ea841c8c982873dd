//! Trade side, status, and identifier types.
//!
//! Provides the small enums and identifiers shared by every component that
//! touches a trade's lifecycle: entry engines, the trade manager, the
//! executor, and the active trade supervisor.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// The YES/NO leg of a binary event contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Yes,
    No,
}

impl TradeSide {
    /// Returns the opposing leg of the same market.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yes => write!(f, "YES"),
            Self::No => write!(f, "NO"),
        }
    }
}

/// How a trade was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryMethod {
    Manual,
    Auto,
}

impl fmt::Display for EntryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Trade lifecycle status.
///
/// Transitions are one-directional: `Pending -> {Open, Failed}`,
/// `Open -> Closing -> Closed`. No other edge is ever valid; callers use
/// [`TradeStatus::can_transition_to`] to enforce this instead of assigning
/// the field directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    Open,
    Closing,
    Closed,
    Failed,
}

impl TradeStatus {
    /// True if `self -> next` is one of the edges allowed by the trade
    /// lifecycle invariant.
    pub fn can_transition_to(&self, next: TradeStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Open)
                | (Self::Pending, Self::Failed)
                | (Self::Open, Self::Closing)
                | (Self::Closing, Self::Closed)
        )
    }

    /// True if no further mutation of this trade is expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Open => write!(f, "open"),
            Self::Closing => write!(f, "closing"),
            Self::Closed => write!(f, "closed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Exchange-side order/ticket identifier.
///
/// Every entry and close call into the executor is idempotent by this id:
/// a retried call with the same `TicketId` is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(String);

impl TicketId {
    /// Create a new unique ticket id.
    ///
    /// Format: `tkt_{timestamp_ms}_{uuid_short}`.
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().to_string()[..8];
        Self(format!("tkt_{ts}_{uuid_short}"))
    }

    /// Wrap an existing string (e.g. parsed from an exchange response).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TicketId {
    fn from(s: String) -> Self {
        Self::from_string(s)
    }
}

impl AsRef<str> for TicketId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trade_side_opposite() {
        assert_eq!(TradeSide::Yes.opposite(), TradeSide::No);
        assert_eq!(TradeSide::No.opposite(), TradeSide::Yes);
    }

    #[test]
    fn test_status_forward_edges_allowed() {
        assert!(TradeStatus::Pending.can_transition_to(TradeStatus::Open));
        assert!(TradeStatus::Pending.can_transition_to(TradeStatus::Failed));
        assert!(TradeStatus::Open.can_transition_to(TradeStatus::Closing));
        assert!(TradeStatus::Closing.can_transition_to(TradeStatus::Closed));
    }

    #[test]
    fn test_status_skip_and_reverse_edges_rejected() {
        assert!(!TradeStatus::Pending.can_transition_to(TradeStatus::Closing));
        assert!(!TradeStatus::Pending.can_transition_to(TradeStatus::Closed));
        assert!(!TradeStatus::Open.can_transition_to(TradeStatus::Closed));
        assert!(!TradeStatus::Closed.can_transition_to(TradeStatus::Open));
        assert!(!TradeStatus::Closing.can_transition_to(TradeStatus::Open));
        assert!(!TradeStatus::Failed.can_transition_to(TradeStatus::Pending));
    }

    #[test]
    fn test_terminal_states() {
        assert!(TradeStatus::Closed.is_terminal());
        assert!(TradeStatus::Failed.is_terminal());
        assert!(!TradeStatus::Open.is_terminal());
        assert!(!TradeStatus::Pending.is_terminal());
        assert!(!TradeStatus::Closing.is_terminal());
    }

    #[test]
    fn test_ticket_id_unique() {
        let id1 = TicketId::new();
        let id2 = TicketId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_ticket_id_format() {
        let id = TicketId::new();
        assert!(id.as_str().starts_with("tkt_"));
    }
}
