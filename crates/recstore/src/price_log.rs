//! `live_data.<symbol>_price_log`: owned exclusively by the corresponding
//! price watchdog. Upsert-on-timestamp keeps the series monotonic per
//! symbol; every insert also evicts rows outside the 30-day EST window.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use reccore::est_time::{now_rounded_to_second, rolling_window_cutoff};
use reccore::{Price, PriceTick};

use crate::error::Result;
use crate::ident::validate_symbol;
use crate::notify::{ChangeNotifier, DbChange};

#[derive(FromRow)]
struct PriceTickRow {
    timestamp: DateTime<Utc>,
    price: Decimal,
}

impl From<PriceTickRow> for PriceTick {
    fn from(row: PriceTickRow) -> Self {
        PriceTick {
            timestamp: row.timestamp,
            price: Price::new(row.price),
        }
    }
}

pub struct PriceLogTable {
    pool: PgPool,
    notifier: ChangeNotifier,
}

impl PriceLogTable {
    pub fn new(pool: PgPool, notifier: ChangeNotifier) -> Self {
        Self { pool, notifier }
    }

    /// Insert a tick, or overwrite the price at an already-seen timestamp
    /// (the latest fetch for a given second wins), then evict ticks older
    /// than the 30-day rolling window.
    pub async fn record(&self, symbol: &str, tick: PriceTick) -> Result<()> {
        let symbol = validate_symbol(symbol)?;
        let table = format!("{symbol}_price_log");

        let insert_sql = format!(
            "INSERT INTO live_data.{table} (timestamp, price)
             VALUES ($1, $2)
             ON CONFLICT (timestamp) DO UPDATE SET price = EXCLUDED.price"
        );
        sqlx::query(&insert_sql)
            .bind(tick.timestamp)
            .bind(tick.price.inner())
            .execute(&self.pool)
            .await?;

        // Anchored to "now", not the inserted tick's own timestamp: a
        // backdated insert must still evict rows older than 30 days from
        // the present, not from whatever timestamp it carries.
        let cutoff = rolling_window_cutoff(now_rounded_to_second());
        let delete_sql = format!("DELETE FROM live_data.{table} WHERE timestamp < $1");
        sqlx::query(&delete_sql)
            .bind(cutoff)
            .execute(&self.pool)
            .await?;

        self.notifier
            .publish(DbChange::new(format!("{symbol}_price_log"), None))
            .await;
        Ok(())
    }

    pub async fn latest(&self, symbol: &str) -> Result<Option<PriceTick>> {
        let symbol = validate_symbol(symbol)?;
        let table = format!("{symbol}_price_log");
        let sql = format!(
            "SELECT timestamp, price FROM live_data.{table}
             ORDER BY timestamp DESC LIMIT 1"
        );
        let row: Option<PriceTickRow> = sqlx::query_as(&sql).fetch_optional(&self.pool).await?;
        Ok(row.map(PriceTick::from))
    }

    pub async fn range(
        &self,
        symbol: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<PriceTick>> {
        let symbol = validate_symbol(symbol)?;
        let table = format!("{symbol}_price_log");
        let sql = format!(
            "SELECT timestamp, price FROM live_data.{table}
             WHERE timestamp >= $1 ORDER BY timestamp ASC"
        );
        let rows: Vec<PriceTickRow> = sqlx::query_as(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(PriceTick::from).collect())
    }
}
