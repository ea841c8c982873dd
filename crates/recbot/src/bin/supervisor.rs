//! Process supervisor binary (spec.md §4.2): brings every autostart
//! service up in dependency order and serves the control-plane RPC
//! surface the dashboard and the cascading failure detector call into.

use clap::Parser;
use recbot::AppConfig;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via REC_CONFIG env var).
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rectelemetry::init_logging()?;
    let args = Args::parse();
    let config = AppConfig::load(args.config)?;

    let manifest_path = std::path::PathBuf::from(&config.service_manifest_path);
    let manifest = config.service_manifest()?;
    let registry = config.port_registry()?;

    let handle = recsupervisor::spawn_actor(&manifest, registry.clone());
    recsupervisor::rpc::bootstrap(&handle, &manifest).await;

    let assignment = registry.get_assignment("supervisor")?;
    let router = recsupervisor::create_router(handle, manifest_path);

    tracing::info!(host = %assignment.host, port = assignment.port, "supervisor listening");
    let listener =
        tokio::net::TcpListener::bind((assignment.host.as_str(), assignment.port)).await?;
    axum::serve(listener, router).await?;
    Ok(())
}
