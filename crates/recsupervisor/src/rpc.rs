//! HTTP control surface for the Supervisor, grounded on the dashboard's
//! `Router::new().route(...).with_state(state)` shape.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;

use std::path::PathBuf;

use recconfig::ServiceManifest;

use crate::supervisor::SupervisorHandle;

#[derive(Clone)]
pub struct AppState {
    pub supervisor: SupervisorHandle,
    pub manifest_path: PathBuf,
}

pub fn create_router(supervisor: SupervisorHandle, manifest_path: PathBuf) -> Router {
    let state = AppState {
        supervisor,
        manifest_path,
    };
    Router::new()
        .route("/list", get(list_services))
        .route("/status/:name", get(service_status))
        .route("/start/:name", post(start_service))
        .route("/stop/:name", post(stop_service))
        .route("/restart/:name", post(restart_service))
        .route("/reload", post(reload_services))
        .with_state(state)
}

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

async fn list_services(State(state): State<AppState>) -> impl IntoResponse {
    match state.supervisor.list().await {
        Ok(services) => Json(services).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn service_status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.supervisor.status(&name).await {
        Ok(status) => Json(status).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn start_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.supervisor.start(&name).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn stop_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.supervisor.stop(&name).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

async fn restart_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.supervisor.restart(&name).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

/// Re-read the manifest from disk and bring up any autostart service not
/// already running. Does not stop or restart services already running —
/// picking up an added service is the only thing a reload is for; changing
/// an existing service's command/args requires an explicit `restart`.
async fn reload_services(State(state): State<AppState>) -> impl IntoResponse {
    match ServiceManifest::load(&state.manifest_path) {
        Ok(manifest) => match state.supervisor.start_all(&manifest).await {
            Ok(()) => StatusCode::OK.into_response(),
            Err(err) => error_response(err).into_response(),
        },
        Err(err) => error_response(err).into_response(),
    }
}

/// Bring up every autostart service in dependency order before serving.
pub async fn bootstrap(supervisor: &SupervisorHandle, manifest: &ServiceManifest) {
    if let Err(err) = supervisor.start_all(manifest).await {
        tracing::error!(error = %err, "failed to bring up autostart services");
    }
}
