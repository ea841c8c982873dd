//! BTC/USD spot-price watchdog (spec.md §4.3): one `PriceFeed` instance,
//! 1 Hz Coinbase polling into the shared Store.

use std::sync::Arc;

use clap::Parser;
use recbot::AppConfig;
use recfeed::PriceFeed;
use recstore::Store;
use tokio_util::sync::CancellationToken;

const SYMBOL: &str = "BTC";

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

    let store = Arc::new(Store::connect(&config.database_url, config.notify_url.clone()).await?);
    let registry = config.port_registry()?;
    let assignment = registry.get_assignment("btc_price_watchdog")?;

    let feed = PriceFeed::new(SYMBOL, store);
    let token = CancellationToken::new();
    spawn_shutdown_signal(token.clone());

    tracing::info!(symbol = SYMBOL, "btc_price_watchdog starting");
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
