//! Trade manager (spec.md §4.6): owns the single-writer order queue and
//! exposes it to `active_trade_supervisor`/`auto_entry_supervisor` over
//! the HTTP seam in `recbot::rpc`.

use std::sync::Arc;

use clap::Parser;
use recaccount::KalshiCredentials;
use recbot::AppConfig;
use rectrade::{OrderClient, TradeExecutor, TradeManager};
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

    let registry = config.port_registry()?;
    let assignment = registry.get_assignment("trade_manager")?;

    let trades = config.connect_trade_table().await?;
    let credentials: KalshiCredentials = config.kalshi.credentials()?;
    let order_client = OrderClient::new(config.kalshi.kalshi_env()?, credentials)?;

    let token = CancellationToken::new();
    let (executor, executor_task) = TradeExecutor::spawn(order_client, token.clone());
    let manager = Arc::new(TradeManager::new(config.user.clone(), trades, Arc::new(executor)));

    spawn_shutdown_signal(token.clone());
    let router = recbot::rpc::server_router(manager);

    tracing::info!(host = %assignment.host, port = assignment.port, "trade_manager listening");
    let listener =
        tokio::net::TcpListener::bind((assignment.host.as_str(), assignment.port)).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(wait_for(token.clone()))
        .await?;
    executor_task.abort();
    Ok(())
}

async fn wait_for(token: CancellationToken) {
    token.cancelled().await;
}

fn spawn_shutdown_signal(token: CancellationToken) {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        token.cancel();
    });
}
