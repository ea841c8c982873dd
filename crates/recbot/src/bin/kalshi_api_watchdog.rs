//! Kalshi market-data watchdog (spec.md §4.3): runs the `MarketFeed`
//! websocket (with HTTP-poll fallback) for the configured watchlist and
//! keeps its `MarketState` cache warm for anything observing this process
//! standalone.

use clap::Parser;
use recbot::AppConfig;
use recfeed::{MarketFeed, MarketFeedConfig};
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

    let registry = config.port_registry()?;
    let assignment = registry.get_assignment("kalshi_api_watchdog")?;

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
    let feed = MarketFeed::new(feed_config);
    let token = CancellationToken::new();
    spawn_shutdown_signal(token.clone());

    tracing::info!(watchlist = config.watchlist.len(), "kalshi_api_watchdog starting");
    tokio::select! {
        () = feed.run(token) => {}
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
