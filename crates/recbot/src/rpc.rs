//! HTTP seam between the `trade_manager` process and whichever process
//! holds an `EntryIntent`/`CloseIntent` to deliver (`active_trade_supervisor`,
//! `auto_entry_supervisor`) in the standalone multi-process topology.
//!
//! `rectrade::TradeExecutor`'s single-writer order queue is an in-process
//! `mpsc` channel, and `TradeManager::new` takes the executor by concrete
//! `Arc<TradeExecutor>`, not a trait object — so the queue cannot span OS
//! processes without a broker, which SPEC_FULL.md's ambient stack does not
//! name. `server_router` exposes the two operations TradeManager offers as
//! `POST /open`/`POST /close/:trade_id`; `TradeManagerClient` implements
//! `recentry::open::EntryOpener`/`recats::close::TradeCloser` by calling
//! them, the same shape `reccfd::client::SupervisorClient` uses for the
//! Supervisor's control surface.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::Router;
use serde::Serialize;

use reccore::{CloseIntent, EntryIntent};
use recats::close::TradeCloser;
use recentry::open::EntryOpener;
use rectrade::TradeManager;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(err: impl std::fmt::Display) -> impl IntoResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
}

pub fn server_router(manager: Arc<TradeManager>) -> Router {
    Router::new()
        .route("/open", post(open_handler))
        .route("/close/:trade_id", post(close_handler))
        .merge(crate::health::router())
        .with_state(manager)
}

async fn open_handler(
    State(manager): State<Arc<TradeManager>>,
    Json(intent): Json<EntryIntent>,
) -> impl IntoResponse {
    match EntryOpener::open_trade(manager.as_ref(), intent).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn close_handler(
    State(manager): State<Arc<TradeManager>>,
    Path(trade_id): Path<u64>,
) -> impl IntoResponse {
    let intent = CloseIntent::new(trade_id, 0, chrono::Utc::now().timestamp_millis());
    match TradeCloser::close_trade(manager.as_ref(), intent).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

/// Remote handle to a `trade_manager` process's TradeManager.
#[derive(Clone)]
pub struct TradeManagerClient {
    base_url: String,
    http: reqwest::Client,
}

impl TradeManagerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EntryOpener for TradeManagerClient {
    async fn open_trade(&self, intent: EntryIntent) -> Result<(), String> {
        let url = format!("{}/open", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&intent)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!(
                "trade_manager rejected open_trade: HTTP {}",
                response.status()
            ))
        }
    }
}

#[async_trait]
impl TradeCloser for TradeManagerClient {
    async fn close_trade(&self, intent: CloseIntent) -> Result<(), String> {
        let url = format!("{}/close/{}", self.base_url, intent.trade_id);
        let response = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!(
                "trade_manager rejected close_trade: HTTP {}",
                response.status()
            ))
        }
    }
}
