//! `trade_preferences_<user>`: read by ATS and AutoEntryEngine, written by
//! the UI. A single row per user.

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use reccore::Preferences;

use crate::error::Result;
use crate::ident::validate_user_id;
use crate::notify::{ChangeNotifier, DbChange};

#[derive(FromRow)]
struct PreferencesRow {
    user_id: String,
    auto_entry: bool,
    auto_stop: bool,
    position_size: i64,
    multiplier: i64,
    min_probability: Decimal,
    min_differential: Decimal,
    min_time_seconds: i64,
    max_time_seconds: i64,
    min_ttc_seconds: i64,
    allow_re_entry: bool,
    min_current_probability: Decimal,
    min_current_ttc_seconds: i64,
    momentum_spike_enabled: bool,
    momentum_spike_threshold: Decimal,
    watchlist_min_volume: i64,
    watchlist_max_ask: Decimal,
    spike_alert_momentum_threshold: Decimal,
    spike_alert_cooldown_threshold: Decimal,
    spike_alert_cooldown_minutes: i64,
}

impl From<PreferencesRow> for Preferences {
    fn from(row: PreferencesRow) -> Self {
        Preferences {
            user_id: row.user_id,
            auto_entry: row.auto_entry,
            auto_stop: row.auto_stop,
            position_size: row.position_size,
            multiplier: row.multiplier,
            min_probability: row.min_probability,
            min_differential: row.min_differential,
            min_time_seconds: row.min_time_seconds,
            max_time_seconds: row.max_time_seconds,
            min_ttc_seconds: row.min_ttc_seconds,
            allow_re_entry: row.allow_re_entry,
            min_current_probability: row.min_current_probability,
            min_current_ttc_seconds: row.min_current_ttc_seconds,
            momentum_spike_enabled: row.momentum_spike_enabled,
            momentum_spike_threshold: row.momentum_spike_threshold,
            watchlist_min_volume: row.watchlist_min_volume,
            watchlist_max_ask: row.watchlist_max_ask,
            spike_alert_momentum_threshold: row.spike_alert_momentum_threshold,
            spike_alert_cooldown_threshold: row.spike_alert_cooldown_threshold,
            spike_alert_cooldown_minutes: row.spike_alert_cooldown_minutes,
        }
    }
}

pub struct PreferencesTable {
    pool: PgPool,
    notifier: ChangeNotifier,
}

impl PreferencesTable {
    pub fn new(pool: PgPool, notifier: ChangeNotifier) -> Self {
        Self { pool, notifier }
    }

    pub async fn get(&self, user: &str) -> Result<Preferences> {
        validate_user_id(user)?;
        let table = format!("trade_preferences_{user}");
        let sql = format!(
            "SELECT user_id, auto_entry, auto_stop, position_size, multiplier,
                    min_probability, min_differential, min_time_seconds, max_time_seconds,
                    min_ttc_seconds, allow_re_entry, min_current_probability,
                    min_current_ttc_seconds, momentum_spike_enabled, momentum_spike_threshold,
                    watchlist_min_volume, watchlist_max_ask, spike_alert_momentum_threshold,
                    spike_alert_cooldown_threshold, spike_alert_cooldown_minutes
             FROM {table} WHERE user_id = $1"
        );
        let row: Option<PreferencesRow> = sqlx::query_as(&sql)
            .bind(user)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Preferences::from).unwrap_or_else(|| Preferences {
            user_id: user.to_string(),
            ..Preferences::default()
        }))
    }

    pub async fn upsert(&self, prefs: &Preferences) -> Result<()> {
        validate_user_id(&prefs.user_id)?;
        let table = format!("trade_preferences_{}", prefs.user_id);
        let sql = format!(
            "INSERT INTO {table}
                (user_id, auto_entry, auto_stop, position_size, multiplier,
                 min_probability, min_differential, min_time_seconds, max_time_seconds,
                 min_ttc_seconds, allow_re_entry, min_current_probability,
                 min_current_ttc_seconds, momentum_spike_enabled, momentum_spike_threshold,
                 watchlist_min_volume, watchlist_max_ask, spike_alert_momentum_threshold,
                 spike_alert_cooldown_threshold, spike_alert_cooldown_minutes)
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17,$18,$19,$20)
             ON CONFLICT (user_id) DO UPDATE SET
                auto_entry = EXCLUDED.auto_entry,
                auto_stop = EXCLUDED.auto_stop,
                position_size = EXCLUDED.position_size,
                multiplier = EXCLUDED.multiplier,
                min_probability = EXCLUDED.min_probability,
                min_differential = EXCLUDED.min_differential,
                min_time_seconds = EXCLUDED.min_time_seconds,
                max_time_seconds = EXCLUDED.max_time_seconds,
                min_ttc_seconds = EXCLUDED.min_ttc_seconds,
                allow_re_entry = EXCLUDED.allow_re_entry,
                min_current_probability = EXCLUDED.min_current_probability,
                min_current_ttc_seconds = EXCLUDED.min_current_ttc_seconds,
                momentum_spike_enabled = EXCLUDED.momentum_spike_enabled,
                momentum_spike_threshold = EXCLUDED.momentum_spike_threshold,
                watchlist_min_volume = EXCLUDED.watchlist_min_volume,
                watchlist_max_ask = EXCLUDED.watchlist_max_ask,
                spike_alert_momentum_threshold = EXCLUDED.spike_alert_momentum_threshold,
                spike_alert_cooldown_threshold = EXCLUDED.spike_alert_cooldown_threshold,
                spike_alert_cooldown_minutes = EXCLUDED.spike_alert_cooldown_minutes"
        );
        sqlx::query(&sql)
            .bind(&prefs.user_id)
            .bind(prefs.auto_entry)
            .bind(prefs.auto_stop)
            .bind(prefs.position_size)
            .bind(prefs.multiplier)
            .bind(prefs.min_probability)
            .bind(prefs.min_differential)
            .bind(prefs.min_time_seconds)
            .bind(prefs.max_time_seconds)
            .bind(prefs.min_ttc_seconds)
            .bind(prefs.allow_re_entry)
            .bind(prefs.min_current_probability)
            .bind(prefs.min_current_ttc_seconds)
            .bind(prefs.momentum_spike_enabled)
            .bind(prefs.momentum_spike_threshold)
            .bind(prefs.watchlist_min_volume)
            .bind(prefs.watchlist_max_ask)
            .bind(prefs.spike_alert_momentum_threshold)
            .bind(prefs.spike_alert_cooldown_threshold)
            .bind(prefs.spike_alert_cooldown_minutes)
            .execute(&self.pool)
            .await?;

        self.notifier
            .publish(DbChange::new("trade_preferences", Some(prefs.user_id.clone())))
            .await;
        Ok(())
    }
}
