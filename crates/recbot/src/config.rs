//! Application configuration for every `recbot` binary (spec.md §6).
//!
//! One TOML file per deployment, loaded with `serde` + `toml` following
//! `AppConfig::from_file`'s `CLI arg > REC_CONFIG env var > default path`
//! precedence — the same chain `hip3-bot::main` used for `HIP3_CONFIG`.

use std::path::Path;

use serde::Deserialize;

use recaccount::{KalshiCredentials, KalshiEnv};
use recconfig::{PortRegistry, ServiceManifest};
use recentry::WatchedMarket;

use crate::error::{AppError, AppResult};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const DEFAULT_CONFIG_ENV_VAR: &str = "REC_CONFIG";

fn default_port_manifest_path() -> String {
    "config/ports.json".to_string()
}

fn default_service_manifest_path() -> String {
    "config/services.json".to_string()
}

fn default_price_symbols() -> Vec<String> {
    vec!["BTC".to_string(), "ETH".to_string()]
}

/// Which Kalshi account and credential file this process trades against.
#[derive(Debug, Clone, Deserialize)]
pub struct KalshiConfig {
    /// `"demo"` or `"prod"`.
    pub env: String,
    pub key_id: String,
    /// Path to the PEM-encoded PKCS#8 private key, as found at
    /// `users/<user_id>/credentials/kalshi-credentials/{prod,demo}/kalshi.pem`.
    pub pem_path: String,
}

impl KalshiConfig {
    pub fn kalshi_env(&self) -> AppResult<KalshiEnv> {
        match self.env.as_str() {
            "demo" => Ok(KalshiEnv::Demo),
            "prod" => Ok(KalshiEnv::Prod),
            other => Err(AppError::InvalidConfig(format!(
                "unknown kalshi env '{other}': expected 'demo' or 'prod'"
            ))),
        }
    }

    pub fn credentials(&self) -> AppResult<KalshiCredentials> {
        let pem = std::fs::read_to_string(&self.pem_path)?;
        Ok(KalshiCredentials::from_pem(self.key_id.clone(), &pem)?)
    }

    pub fn ws_url(&self) -> AppResult<String> {
        Ok(match self.kalshi_env()? {
            KalshiEnv::Demo => "wss://demo-api.kalshi.co/trade-api/ws/v2".to_string(),
            KalshiEnv::Prod => "wss://api.elections.kalshi.com/trade-api/ws/v2".to_string(),
        })
    }

    pub fn http_markets_url(&self) -> AppResult<String> {
        Ok(format!("{}/markets", self.kalshi_env()?.base_url()))
    }
}

/// One event market under watch, paired with the underlying symbol its
/// spot price should be read from.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchlistEntry {
    pub ticker: String,
    pub symbol: String,
}

impl From<WatchlistEntry> for WatchedMarket {
    fn from(entry: WatchlistEntry) -> Self {
        WatchedMarket::new(entry.ticker, entry.symbol)
    }
}

/// Top-level deployment configuration, one file per user/environment.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// The account whose `trades_<user>`/`active_trades_<user>` tables
    /// this process owns.
    pub user: String,
    pub database_url: String,
    #[serde(default)]
    pub notify_url: Option<String>,
    #[serde(default = "default_port_manifest_path")]
    pub port_manifest_path: String,
    #[serde(default = "default_service_manifest_path")]
    pub service_manifest_path: String,
    pub kalshi: KalshiConfig,
    #[serde(default)]
    pub watchlist: Vec<WatchlistEntry>,
    #[serde(default = "default_price_symbols")]
    pub price_symbols: Vec<String>,
    /// Base URL of the `trade_manager` process's RPC surface (spec.md
    /// §4.8), used by `active_trade_supervisor`/`auto_entry_supervisor`
    /// when they run as independently supervised processes rather than
    /// embedding TradeManager directly.
    #[serde(default)]
    pub trade_manager_url: Option<String>,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Resolve `CLI arg > REC_CONFIG env var > config/default.toml` and
    /// load from there.
    pub fn load(cli_override: Option<String>) -> AppResult<Self> {
        let path = cli_override
            .or_else(|| std::env::var(DEFAULT_CONFIG_ENV_VAR).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        Self::from_file(path)
    }

    pub fn watched_markets(&self) -> Vec<WatchedMarket> {
        self.watchlist.iter().cloned().map(Into::into).collect()
    }

    pub fn port_registry(&self) -> AppResult<PortRegistry> {
        Ok(PortRegistry::load(&self.port_manifest_path)?)
    }

    pub fn service_manifest(&self) -> AppResult<ServiceManifest> {
        Ok(ServiceManifest::load(&self.service_manifest_path)?)
    }

    /// Connect a fresh Postgres pool and build the one table TradeManager
    /// needs. A second connection from the one `recstore::Store::connect`
    /// would otherwise open, since `Store` only exposes its tables behind
    /// `Arc` and TradeManager needs to own one outright.
    pub async fn connect_trade_table(&self) -> AppResult<recstore::trades::TradeTable> {
        let pool = recstore::pool::connect_pool(&self.database_url).await?;
        let notifier = recstore::ChangeNotifier::new(self.notify_url.clone());
        Ok(recstore::trades::TradeTable::new(pool, notifier))
    }

    pub fn trade_manager_url(&self) -> AppResult<&str> {
        self.trade_manager_url.as_deref().ok_or_else(|| {
            AppError::InvalidConfig(
                "trade_manager_url must be set to reach the trade_manager process".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        user = "alice"
        database_url = "postgres://localhost/recio"

        [kalshi]
        env = "demo"
        key_id = "key-1"
        pem_path = "/tmp/does-not-exist.pem"

        [[watchlist]]
        ticker = "KXBTCD-25JUL30-T100000"
        symbol = "BTC"
    "#;

    #[test]
    fn test_parses_minimal_config_with_defaults() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.user, "alice");
        assert_eq!(config.port_manifest_path, "config/ports.json");
        assert_eq!(config.price_symbols, vec!["BTC", "ETH"]);
        assert_eq!(config.watched_markets().len(), 1);
    }

    #[test]
    fn test_unknown_kalshi_env_is_rejected() {
        let mut config: AppConfig = toml::from_str(SAMPLE).unwrap();
        config.kalshi.env = "staging".to_string();
        assert!(config.kalshi.kalshi_env().is_err());
    }

    #[test]
    fn test_ws_url_matches_env() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert!(config.kalshi.ws_url().unwrap().contains("demo-api"));
    }
}
