//! Active trade supervisor (spec.md §4.6): ticks every open/closing
//! trade, enforces auto-stop, and delivers close intents to the
//! `trade_manager` process over the HTTP seam in `recbot::rpc`.
//!
//! Runs its own embedded `MarketFeed`/`PriceFeed` set rather than sharing
//! the watchdog processes' in-memory caches — `recfeed::MarketState` and
//! `PriceFeedHandle` are purely in-process, so there is no cross-process
//! cache to share without the broker SPEC_FULL.md's ambient stack doesn't
//! name.

use std::collections::HashMap;
use std::sync::Arc;

use clap::Parser;
use recats::close::{drain_close_intents, TradeCloser};
use recats::{ActiveTradeSupervisor, ActiveTradeSupervisorConfig};
use recbot::rpc::TradeManagerClient;
use recbot::AppConfig;
use recfeed::{MarketFeed, MarketFeedConfig, PriceFeed, PriceFeedHandle};
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
    let assignment = registry.get_assignment("active_trade_supervisor")?;

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

    let (close_tx, close_rx) = mpsc::channel(64);
    let closer: Arc<dyn TradeCloser> =
        Arc::new(TradeManagerClient::new(config.trade_manager_url()?.to_string()));
    tokio::spawn(drain_close_intents(close_rx, closer, token.clone()));

    let ats_config = ActiveTradeSupervisorConfig::new(config.user.clone());
    let supervisor = ActiveTradeSupervisor::new(
        ats_config,
        store.clone(),
        market_state,
        price_feeds,
        close_tx,
    );

    tracing::info!("active_trade_supervisor starting");
    tokio::select! {
        () = supervisor.run(token) => {}
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
