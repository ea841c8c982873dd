//! Typed Postgres persistence for the REC.IO trading core.
//!
//! Tables are namespaced per user (`trades_<user>`, `active_trades_<user>`,
//! ...) or per symbol (`<symbol>_price_log`), so table names are built from
//! caller-supplied strings rather than bound as query parameters — every
//! such string is validated by [`ident`] before it is interpolated into SQL
//! text. Any mutation fans a [`notify::DbChange`] out over a local
//! broadcast channel; subscribers treat it as a cache-invalidation hint and
//! always re-read the table for ground truth.

pub mod account;
pub mod error;
pub mod ident;
pub mod notify;
pub mod pool;
pub mod preferences;
pub mod price_log;
pub mod trades;

pub use error::{Result, StoreError};
pub use notify::{ChangeNotifier, DbChange};

use sqlx::PgPool;
use std::sync::Arc;

use account::AccountTables;
use preferences::PreferencesTable;
use price_log::PriceLogTable;
use trades::{ActiveTradeTable, TradeTable};

/// Handle to every typed table, sharing one pool and one change bus.
#[derive(Clone)]
pub struct Store {
    pub trades: Arc<TradeTable>,
    pub active_trades: Arc<ActiveTradeTable>,
    pub price_log: Arc<PriceLogTable>,
    pub preferences: Arc<PreferencesTable>,
    pub account: Arc<AccountTables>,
    notifier: ChangeNotifier,
}

impl Store {
    pub fn new(pool: PgPool, notify_url: Option<String>) -> Self {
        let notifier = ChangeNotifier::new(notify_url);
        Self {
            trades: Arc::new(TradeTable::new(pool.clone(), notifier.clone())),
            active_trades: Arc::new(ActiveTradeTable::new(pool.clone(), notifier.clone())),
            price_log: Arc::new(PriceLogTable::new(pool.clone(), notifier.clone())),
            preferences: Arc::new(PreferencesTable::new(pool.clone(), notifier.clone())),
            account: Arc::new(AccountTables::new(pool, notifier.clone())),
            notifier,
        }
    }

    /// Connect to Postgres and build a [`Store`] over the pool.
    pub async fn connect(database_url: &str, notify_url: Option<String>) -> Result<Self> {
        let pool = pool::connect_pool(database_url).await?;
        Ok(Self::new(pool, notify_url))
    }

    /// Subscribe to every `db_change` this store emits, across all tables.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<DbChange> {
        self.notifier.subscribe()
    }
}
