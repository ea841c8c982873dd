//! Cascading failure detector (spec.md §4.10): polls the Supervisor's
//! service list for newly-FATAL services and feeds them into
//! `CascadingFailureDetector::on_service_fatal`, which issues a
//! rate-limited MASTER_RESTART once enough distinct services go FATAL
//! within its failure window.
//!
//! `reccfd::CascadingFailureDetector` has no built-in poller — it only
//! reacts to calls — so this binary owns the poll loop against the
//! Supervisor's `/list` endpoint.

use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use reccore::{ServiceState, ServiceStatus};
use recbot::AppConfig;
use reccfd::{CascadingFailureDetector, DetectorConfig, SupervisorClient};
use tokio_util::sync::CancellationToken;

const POLL_INTERVAL: Duration = Duration::from_secs(3);

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
    let assignment = registry.get_assignment("cascading_failure_detector")?;
    let supervisor_assignment = registry.get_assignment("supervisor")?;
    let supervisor_url = format!(
        "http://{}:{}",
        supervisor_assignment.host, supervisor_assignment.port
    );

    let http = reqwest::Client::new();
    let supervisor = SupervisorClient::new(supervisor_url.clone());
    let detector = CascadingFailureDetector::new(DetectorConfig::default(), supervisor);

    let token = CancellationToken::new();
    spawn_shutdown_signal(token.clone());

    let poll = poll_loop(http, supervisor_url, detector, token.clone());

    tracing::info!("cascading_failure_detector starting");
    tokio::select! {
        () = poll => {}
        () = recbot::health::serve(&assignment.host, assignment.port) => {}
    }
    Ok(())
}

async fn poll_loop(
    http: reqwest::Client,
    supervisor_url: String,
    detector: CascadingFailureDetector,
    token: CancellationToken,
) {
    let mut already_fatal: HashSet<String> = HashSet::new();
    let list_url = format!("{supervisor_url}/list");

    loop {
        tokio::select! {
            () = token.cancelled() => return,
            () = tokio::time::sleep(POLL_INTERVAL) => {}
        }

        let services: Vec<ServiceState> = match http.get(&list_url).send().await {
            Ok(response) => match response.json().await {
                Ok(services) => services,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to decode supervisor service list");
                    continue;
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "failed to reach supervisor /list");
                continue;
            }
        };

        let now = Utc::now();
        let mut still_fatal = HashSet::new();
        for service in &services {
            if service.status == ServiceStatus::Fatal {
                still_fatal.insert(service.name.clone());
                if !already_fatal.contains(&service.name) {
                    detector.on_service_fatal(&service.name, now).await;
                }
            }
        }
        already_fatal = still_fatal;
    }
}

fn spawn_shutdown_signal(token: CancellationToken) {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        token.cancel();
    });
}
