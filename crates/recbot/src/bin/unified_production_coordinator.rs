//! Unified production coordinator (spec.md §4.11): the single-process
//! production topology. Every component that, run standalone, needs the
//! `recbot::rpc` HTTP seam to reach `trade_manager` instead shares it
//! directly in-process here via `Arc<TradeManager>` as both
//! `EntryOpener`/`TradeCloser` trait objects — the seam exists for the
//! Supervisor's independent-restart dev/debug topology, not for this
//! binary.

use std::collections::HashMap;
use std::sync::Arc;

use clap::Parser;
use recaccount::{AccountClient, AccountSync};
use recats::close::{drain_close_intents, TradeCloser};
use recats::{ActiveTradeSupervisor, ActiveTradeSupervisorConfig};
use recbot::AppConfig;
use recentry::open::EntryOpener;
use recentry::{AutoEntryEngine, EngineConfig};
use recfeed::{MarketFeed, MarketFeedConfig, PriceFeed, PriceFeedHandle};
use rectrade::{OrderClient, TradeExecutor, TradeManager};
use recstore::Store;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rectelemetry::init_logging()?;
    let args = Args::parse();
    let config = AppConfig::load(args.config)?;

    recws::init_crypto();

    let store = Arc::new(Store::connect(&config.database_url, config.notify_url.clone()).await?);
    let registry = config.port_registry()?;
    let assignment = registry.get_assignment("unified_production_coordinator")?;

    let token = CancellationToken::new();
    spawn_shutdown_signal(token.clone());

    // Market data: one MarketFeed for the watchlist, one PriceFeed per
    // tracked spot symbol.
    let market_tickers = config
        .watchlist
        .iter()
        .map(|w| w.ticker.clone())
        .collect();
    let feed_config = MarketFeedConfig {
        ws_url: config.kalshi.ws_url()?,
        http_list_url: config.kalshi.http_markets_url()?,
        market_tickers,
        ..Default::default()
    };
    let market_feed = MarketFeed::new(feed_config);
    let market_state = market_feed.state();
    tokio::spawn(market_feed.run(token.clone()));

    let mut price_feeds: HashMap<String, PriceFeedHandle> = HashMap::new();
    for symbol in &config.price_symbols {
        let feed = PriceFeed::new(symbol.clone(), store.clone());
        price_feeds.insert(symbol.clone(), feed.handle());
        tokio::spawn(feed.run(token.clone()));
    }

    // Account reconciliation.
    let account_client =
        AccountClient::new(config.kalshi.kalshi_env()?, config.kalshi.credentials()?)?;
    let account_sync = AccountSync::new(account_client, store.clone(), config.user.clone());
    tokio::spawn(account_sync.run(token.clone()));

    // Trading core: one order queue, one manager, shared as both trait
    // objects by the active trade supervisor and the auto entry engine.
    let trades = config.connect_trade_table().await?;
    let order_client =
        OrderClient::new(config.kalshi.kalshi_env()?, config.kalshi.credentials()?)?;
    let (executor, executor_task) = TradeExecutor::spawn(order_client, token.clone());
    let manager = Arc::new(TradeManager::new(
        config.user.clone(),
        trades,
        Arc::new(executor),
    ));

    let (close_tx, close_rx) = mpsc::channel(64);
    let closer: Arc<dyn TradeCloser> = manager.clone();
    tokio::spawn(drain_close_intents(close_rx, closer, token.clone()));

    let ats_config = ActiveTradeSupervisorConfig::new(config.user.clone());
    let ats = ActiveTradeSupervisor::new(
        ats_config,
        store.clone(),
        market_state.clone(),
        price_feeds.clone(),
        close_tx,
    );
    tokio::spawn(ats.run(token.clone()));

    let opener: Arc<dyn EntryOpener> = manager.clone();
    let engine_config = EngineConfig::new(config.user.clone(), config.watched_markets());
    let engine = AutoEntryEngine::new(
        engine_config,
        store.clone(),
        market_state,
        price_feeds,
        opener,
    );
    tokio::spawn(engine.run(token.clone()));

    tracing::info!(user = %config.user, "unified_production_coordinator starting");
    tokio::select! {
        () = recbot::health::serve(&assignment.host, assignment.port) => {}
        () = token.cancelled() => {}
    }

    executor_task.abort();
    Ok(())
}

fn spawn_shutdown_signal(token: CancellationToken) {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        token.cancel();
    });
}
