//! Standalone trade executor (spec.md §4.9): owns its own Kalshi order
//! queue and exposes ops-only manual submission endpoints. This is
//! separate from `trade_manager`'s real trading path — it exists for
//! operator-driven manual intervention (e.g. flattening a position by
//! hand) and standalone observability of the executor's health, not for
//! everyday entry/close flow.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use clap::Parser;
use reccore::{EventTicker, Price, TicketId, TradeSide};
use recbot::AppConfig;
use rectrade::{OrderClient, TradeExecutor};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    config: Option<String>,
}

#[derive(Clone)]
struct AppState {
    executor: Arc<TradeExecutor>,
}

#[derive(Debug, Deserialize)]
struct SubmitOpenRequest {
    ticket_id: String,
    contract: String,
    side: TradeSide,
    price: rust_decimal::Decimal,
    count: i64,
}

#[derive(Debug, Deserialize)]
struct SubmitCloseRequest {
    ticket_id: String,
    contract: String,
    side: TradeSide,
    count: i64,
}

#[derive(Debug, Serialize)]
struct OrderAckResponse {
    order_id: String,
    status: String,
}

async fn submit_open(
    State(state): State<AppState>,
    Json(req): Json<SubmitOpenRequest>,
) -> Result<Json<OrderAckResponse>, StatusCode> {
    let ticket_id = TicketId::from_string(req.ticket_id);
    let contract = EventTicker::from(req.contract);
    let price = Price::from(req.price);
    match state
        .executor
        .submit_open(&ticket_id, &contract, req.side, price, req.count)
        .await
    {
        Ok(ack) => Ok(Json(OrderAckResponse {
            order_id: ack.order_id,
            status: ack.status,
        })),
        Err(err) => {
            tracing::error!(error = %err, "manual submit_open failed");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

async fn submit_close(
    State(state): State<AppState>,
    Json(req): Json<SubmitCloseRequest>,
) -> Result<Json<OrderAckResponse>, StatusCode> {
    let ticket_id = TicketId::from_string(req.ticket_id);
    let contract = EventTicker::from(req.contract);
    match state
        .executor
        .submit_close(&ticket_id, &contract, req.side, req.count)
        .await
    {
        Ok(ack) => Ok(Json(OrderAckResponse {
            order_id: ack.order_id,
            status: ack.status,
        })),
        Err(err) => {
            tracing::error!(error = %err, "manual submit_close failed");
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/submit_open", post(submit_open))
        .route("/submit_close", post(submit_close))
        .merge(recbot::health::router())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rectelemetry::init_logging()?;
    let args = Args::parse();
    let config = AppConfig::load(args.config)?;

    let registry = config.port_registry()?;
    let assignment = registry.get_assignment("trade_executor")?;

    let order_client = OrderClient::new(config.kalshi.kalshi_env()?, config.kalshi.credentials()?)?;
    let token = CancellationToken::new();
    let (executor, executor_task) = TradeExecutor::spawn(order_client, token.clone());
    let state = AppState {
        executor: Arc::new(executor),
    };

    spawn_shutdown_signal(token.clone());

    tracing::info!(host = %assignment.host, port = assignment.port, "trade_executor listening");
    let listener =
        tokio::net::TcpListener::bind((assignment.host.as_str(), assignment.port)).await?;
    axum::serve(listener, router(state))
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
