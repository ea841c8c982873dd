//! AccountSync: periodic reconciliation of positions, fills, orders,
//! settlements and balance from Kalshi into the Store (spec.md §4.5).
//!
//! `auth` signs requests with the user's Kalshi API key id + PEM private
//! key; `client` is a thin typed wrapper over the portfolio endpoints,
//! modeled on `hip3-registry::client::MetaClient`; `sync` drives the
//! cadence loop and upserts into `recstore::account`.

pub mod auth;
pub mod client;
pub mod error;
pub mod sync;

pub use auth::{KalshiCredentials, KalshiEnv, SignedHeaders};
pub use client::AccountClient;
pub use error::{AccountError, AccountResult};
pub use sync::AccountSync;
