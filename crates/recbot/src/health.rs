//! Minimal `GET /healthz` surface every service binary exposes, grounded
//! on `recsupervisor::rpc`'s router construction. Polled by the cascading
//! failure detector's HTTP health-sample path (spec.md §4.10) and by an
//! operator's own monitoring.

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

pub fn router() -> Router {
    Router::new().route("/healthz", get(|| async { StatusCode::OK }))
}

/// Bind and serve the healthz router until the process exits. Failures to
/// bind or serve are logged, not fatal — a binary's main loop is more
/// important than its health endpoint.
pub async fn serve(host: &str, port: u16) {
    let addr = format!("{host}:{port}");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "failed to bind healthz listener");
            return;
        }
    };
    if let Err(err) = axum::serve(listener, router()).await {
        tracing::error!(%addr, error = %err, "healthz server exited");
    }
}
