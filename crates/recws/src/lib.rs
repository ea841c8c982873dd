//! WebSocket client for Kalshi's `ticker_v2` market data channel.
//!
//! Provides robust WebSocket connectivity with:
//! - Automatic reconnection with exponential backoff
//! - Subscription management and ready-state tracking
//! - Heartbeat monitoring (45s ping, pong timeout detection)
//! - Rate limiting
//! - Channel-based message routing

pub mod connection;
pub mod error;
pub mod heartbeat;
pub mod message;
pub mod rate_limiter;
pub mod subscription;

pub use connection::{ConnectionConfig, ConnectionManager, ConnectionState};
pub use error::{WsError, WsResult};
pub use message::{PongMessage, TickerV2Message, WsMessage, WsRequest};
pub use subscription::{ReadyState, SubscriptionManager};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any WebSocket connections are made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
