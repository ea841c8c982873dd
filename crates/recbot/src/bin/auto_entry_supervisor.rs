//! Auto entry supervisor (spec.md §4.5): evaluates the watchlist on its
//! tick cadence and delivers entry intents to the `trade_manager` process
//! over the HTTP seam in `recbot::rpc`.
//!
//! Runs its own embedded `MarketFeed`/`PriceFeed` set, for the same
//! reason `active_trade_supervisor` does — see that binary's header.

use std::collections::HashMap;
use std::sync::Arc;

use clap::Parser;
use recbot::rpc::TradeManagerClient;
use recbot::AppConfig;
use recentry::open::EntryOpener;
use recentry::{AutoEntryEngine, EngineConfig};
use recfeed::{MarketFeed, MarketFeedConfig, PriceFeed, PriceFeedHandle};
use recstore::Store;
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
    let assignment = registry.get_assignment("auto_entry_supervisor")?;

    let token = CancellationToken::new();
    spawn_shutdown_signal(token.clone());

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

    let opener: Arc<dyn EntryOpener> =
        Arc::new(TradeManagerClient::new(config.trade_manager_url()?.to_string()));

    let engine_config = EngineConfig::new(config.user.clone(), config.watched_markets());
    let engine = AutoEntryEngine::new(engine_config, store, market_state, price_feeds, opener);

    tracing::info!("auto_entry_supervisor starting");
    tokio::select! {
        () = engine.run(token) => {}
        () = recbot::health::serve(&assignment.host, assignment.port) => {}
    }
    Ok(())
}

fn spawn_shutdown_signal(token: CancellationToken) {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        token.cancel();
    });
}
