//! Account-state reconciliation watchdog (spec.md §4.4): polls Kalshi's
//! orders/fills/positions/settlements/balance endpoints on a fixed
//! interval and reconciles them into the shared Store.

use std::sync::Arc;

use clap::Parser;
use recaccount::{AccountClient, AccountSync};
use recbot::AppConfig;
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

    let store = Arc::new(Store::connect(&config.database_url, config.notify_url.clone()).await?);
    let registry = config.port_registry()?;
    let assignment = registry.get_assignment("kalshi_account_sync")?;

    let client = AccountClient::new(config.kalshi.kalshi_env()?, config.kalshi.credentials()?)?;
    let sync = AccountSync::new(client, store, config.user.clone());

    let token = CancellationToken::new();
    spawn_shutdown_signal(token.clone());

    tracing::info!(user = %config.user, "kalshi_account_sync starting");
    tokio::select! {
        () = sync.run(token) => {}
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
