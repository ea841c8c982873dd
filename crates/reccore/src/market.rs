//! Kalshi event market identification and snapshot types.
//!
//! A Kalshi event market is identified by a ticker string (e.g.
//! `KXBTCD-25JUL3017-T107250`), quotes a strike, and trades a YES and a NO
//! leg each with their own bid/ask. `MarketSnapshot` is the last-known,
//! read-mostly view maintained by MarketFeed and consumed by ATS and
//! AutoEntryEngine.

use crate::{Price, Size};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique market identifier as assigned by the exchange.
///
/// This is the primary key for a tradeable event market. Unlike a
/// composite numeric key, Kalshi tickers are opaque strings; callers must
/// not assume any internal structure beyond uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventTicker(pub String);

impl EventTicker {
    pub fn new(ticker: impl Into<String>) -> Self {
        Self(ticker.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for EventTicker {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EventTicker {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle status of an event market as reported by the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    /// Accepting orders.
    Open,
    /// No longer accepting orders, result not yet final.
    Closed,
    /// Result finalized.
    Settled,
}

impl fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Settled => write!(f, "settled"),
        }
    }
}

/// Validity classification of a YES/NO quote book, mirroring the checks a
/// decision engine must run before trusting a snapshot's prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookState {
    /// Both sides quoted and non-crossed.
    Valid,
    /// YES side has no bid.
    NoYesBid,
    /// YES side has no ask.
    NoYesAsk,
    /// Both sides empty.
    Empty,
    /// Bid >= ask on the same leg (should not happen; treat as untradeable).
    Crossed,
}

impl fmt::Display for BookState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => write!(f, "valid"),
            Self::NoYesBid => write!(f, "no_yes_bid"),
            Self::NoYesAsk => write!(f, "no_yes_ask"),
            Self::Empty => write!(f, "empty"),
            Self::Crossed => write!(f, "crossed"),
        }
    }
}

/// Last-known per-event view of strikes, YES/NO bids/asks, volumes, and
/// event status. Overwritten wholesale on every MarketFeed update; never
/// partially mutated by readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: EventTicker,
    pub strike: Price,
    pub yes_bid: Price,
    pub yes_ask: Price,
    pub no_bid: Price,
    pub no_ask: Price,
    pub yes_volume: Size,
    pub no_volume: Size,
    pub status: MarketStatus,
    /// Distance between adjacent strikes for this market's ladder.
    pub tier_spacing: Price,
    pub close_time: DateTime<Utc>,
    /// When this market's trading window opened. Falls back to the time
    /// MarketFeed first observed the ticker when the exchange doesn't
    /// report one (e.g. a websocket delta for a market with no prior
    /// snapshot) — see AutoEntryEngine's time-window gate.
    pub open_time: DateTime<Utc>,
    pub received_at: DateTime<Utc>,
}

impl MarketSnapshot {
    /// Seconds remaining until the event closes; negative once past close.
    pub fn ttc_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.close_time - now).num_seconds()
    }

    /// Seconds elapsed since this market's trading window opened.
    pub fn time_since_open_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.open_time).num_seconds()
    }

    /// Market-implied probability (0-100) of the YES leg, taken as the
    /// midpoint of the YES bid/ask in cents.
    pub fn implied_probability_yes(&self) -> Option<rust_decimal::Decimal> {
        if !matches!(self.book_state(), BookState::Valid) {
            return None;
        }
        Some((self.yes_bid.inner() + self.yes_ask.inner()) / rust_decimal::Decimal::from(2))
    }

    /// Classify the YES quote book's tradeability.
    pub fn book_state(&self) -> BookState {
        let has_bid = self.yes_bid.is_positive();
        let has_ask = self.yes_ask.is_positive();
        match (has_bid, has_ask) {
            (false, false) => BookState::Empty,
            (false, true) => BookState::NoYesBid,
            (true, false) => BookState::NoYesAsk,
            (true, true) => {
                if self.yes_bid >= self.yes_ask {
                    BookState::Crossed
                } else {
                    BookState::Valid
                }
            }
        }
    }

    /// True if this snapshot can currently back a trade decision.
    pub fn is_tradeable(&self) -> bool {
        matches!(self.status, MarketStatus::Open) && matches!(self.book_state(), BookState::Valid)
    }

    /// Age of this snapshot relative to `now`, in milliseconds.
    pub fn age_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.received_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn snapshot(yes_bid: &str, yes_ask: &str) -> MarketSnapshot {
        MarketSnapshot {
            ticker: EventTicker::new("KXBTCD-TEST"),
            strike: Price::new(dec!(107250)),
            yes_bid: Price::new(yes_bid.parse().unwrap()),
            yes_ask: Price::new(yes_ask.parse().unwrap()),
            no_bid: Price::ZERO,
            no_ask: Price::ZERO,
            yes_volume: Size::ZERO,
            no_volume: Size::ZERO,
            status: MarketStatus::Open,
            tier_spacing: Price::new(dec!(250)),
            close_time: Utc::now() + Duration::seconds(1800),
            open_time: Utc::now() - Duration::seconds(300),
            received_at: Utc::now(),
        }
    }

    #[test]
    fn test_event_ticker_display() {
        let t = EventTicker::new("KXBTCD-25JUL3017-T107250");
        assert_eq!(t.to_string(), "KXBTCD-25JUL3017-T107250");
    }

    #[test]
    fn test_book_state_valid() {
        let s = snapshot("60", "62");
        assert_eq!(s.book_state(), BookState::Valid);
        assert!(s.is_tradeable());
    }

    #[test]
    fn test_book_state_no_bid() {
        let s = snapshot("0", "62");
        assert_eq!(s.book_state(), BookState::NoYesBid);
        assert!(!s.is_tradeable());
    }

    #[test]
    fn test_book_state_no_ask() {
        let s = snapshot("60", "0");
        assert_eq!(s.book_state(), BookState::NoYesAsk);
        assert!(!s.is_tradeable());
    }

    #[test]
    fn test_book_state_empty() {
        let s = snapshot("0", "0");
        assert_eq!(s.book_state(), BookState::Empty);
    }

    #[test]
    fn test_book_state_crossed() {
        let s = snapshot("65", "60");
        assert_eq!(s.book_state(), BookState::Crossed);
        assert!(!s.is_tradeable());
    }

    #[test]
    fn test_implied_probability_midpoint() {
        let s = snapshot("60", "62");
        assert_eq!(s.implied_probability_yes(), Some(dec!(61)));
    }

    #[test]
    fn test_implied_probability_none_when_untradeable() {
        let s = snapshot("0", "62");
        assert_eq!(s.implied_probability_yes(), None);
    }

    #[test]
    fn test_ttc_seconds_positive_before_close() {
        let s = snapshot("60", "62");
        let ttc = s.ttc_seconds(Utc::now());
        assert!(ttc > 1700 && ttc <= 1800);
    }

    #[test]
    fn test_time_since_open_seconds() {
        let s = snapshot("60", "62");
        let elapsed = s.time_since_open_seconds(Utc::now());
        assert!((295..=305).contains(&elapsed));
    }

    #[test]
    fn test_closed_market_not_tradeable() {
        let mut s = snapshot("60", "62");
        s.status = MarketStatus::Closed;
        assert!(!s.is_tradeable());
    }
}
