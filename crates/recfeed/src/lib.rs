//! Market and spot price data feeds.
//!
//! `MarketFeed` maintains a live, per-ticker snapshot cache fed by Kalshi's
//! `ticker_v2` WebSocket channel (falling back to HTTP polling of the
//! market list on sustained disconnect). `PriceFeed` is a 1 Hz Coinbase
//! spot-price watchdog, one instance per underlying symbol, writing into
//! `recstore`'s rolling price log.

pub mod error;
pub mod market_feed;
pub mod market_state;
pub mod price_feed;

pub use error::{FeedError, FeedResult};
pub use market_feed::{MarketFeed, MarketFeedConfig, HEARTBEAT_STALE_MS};
pub use market_state::MarketState;
pub use price_feed::{PriceFeed, PriceFeedHandle, PRICE_STALE_MS};
