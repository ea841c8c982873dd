//! The Supervisor actor: one tokio task owning every child process, driven
//! by a command channel so all state mutation happens on a single thread.
//!
//! The per-service state machine is STARTING -> RUNNING -> (RESTARTING ->
//! STARTING)* -> STOPPED | FATAL. A service that crashes before completing
//! the stability window keeps incrementing its restart counter; once that
//! counter exceeds `startretries` it goes FATAL and is not retried again
//! until an explicit `start`/`restart` command arrives.

use std::collections::HashMap;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{error, info, warn};

use recconfig::{PortRegistry, ServiceManifest};
use reccore::{ServiceState, ServiceStatus};

use crate::error::{Result, SupervisorError};
use crate::process;
use crate::state::Runtime;

/// Grace period before the first RUNNING readiness probe.
const STARTUP_GRACE: Duration = Duration::from_millis(500);
/// How long readiness probing (pid alive + port bound) keeps retrying
/// before giving up and leaving the service in STARTING.
const READINESS_TIMEOUT: Duration = Duration::from_secs(5);
/// Spacing between readiness probes.
const READINESS_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// How long `start_all` blocks on a dependency reaching RUNNING before
/// giving up and starting its dependents anyway.
const DEPENDENCY_READY_TIMEOUT: Duration = Duration::from_secs(30);
const DEPENDENCY_POLL_INTERVAL: Duration = Duration::from_millis(100);

enum Command {
    Start {
        name: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Stop {
        name: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Restart {
        name: String,
        reply: oneshot::Sender<Result<()>>,
    },
    Status {
        name: String,
        reply: oneshot::Sender<Result<ServiceState>>,
    },
    List {
        reply: oneshot::Sender<Vec<ServiceState>>,
    },
    MarkRunning(String),
    ChildExited {
        name: String,
        status: std::io::Result<ExitStatus>,
    },
}

/// Cheaply-cloneable front for the Supervisor actor.
#[derive(Clone)]
pub struct SupervisorHandle {
    tx: mpsc::Sender<Command>,
}

impl SupervisorHandle {
    pub async fn start(&self, name: &str) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Start {
            name: name.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SupervisorError::ChannelClosed)?
    }

    pub async fn stop(&self, name: &str) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stop {
            name: name.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SupervisorError::ChannelClosed)?
    }

    pub async fn restart(&self, name: &str) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Restart {
            name: name.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SupervisorError::ChannelClosed)?
    }

    pub async fn status(&self, name: &str) -> Result<ServiceState> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Status {
            name: name.to_string(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SupervisorError::ChannelClosed)?
    }

    pub async fn list(&self) -> Result<Vec<ServiceState>> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::List { reply }).await?;
        rx.await.map_err(|_| SupervisorError::ChannelClosed)
    }

    /// Start every `autostart` service in dependency order, leaves first,
    /// blocking on each one reaching RUNNING before starting whatever
    /// depends on it (spec.md §4.2).
    pub async fn start_all(&self, manifest: &ServiceManifest) -> Result<()> {
        for name in manifest.topological_order()? {
            let record = manifest.get(&name)?;
            if !record.autostart {
                continue;
            }
            if let Err(err) = self.start(&name).await {
                error!(service = %name, error = %err, "autostart failed");
                continue;
            }
            self.wait_until_running(&name).await;
        }
        Ok(())
    }

    /// Poll `name`'s status until it reaches RUNNING, or until it stops
    /// retrying (FATAL/STOPPED) or the ready-timeout elapses — whichever
    /// comes first. Never returns an error: a dependency that never comes
    /// up should not abort the rest of `start_all`, only delay it.
    async fn wait_until_running(&self, name: &str) {
        let deadline = Instant::now() + DEPENDENCY_READY_TIMEOUT;
        loop {
            match self.status(name).await {
                Ok(state) => match state.status {
                    ServiceStatus::Running => return,
                    ServiceStatus::Fatal | ServiceStatus::Stopped => {
                        warn!(
                            service = %name,
                            status = %state.status,
                            "dependency did not reach RUNNING, starting dependents anyway"
                        );
                        return;
                    }
                    ServiceStatus::Starting | ServiceStatus::Restarting => {}
                },
                Err(_) => return,
            }

            if Instant::now() >= deadline {
                warn!(service = %name, "timed out waiting for dependency to reach RUNNING");
                return;
            }
            tokio::time::sleep(DEPENDENCY_POLL_INTERVAL).await;
        }
    }

    async fn send(&self, cmd: Command) -> Result<()> {
        self.tx
            .send(cmd)
            .await
            .map_err(|_| SupervisorError::ChannelClosed)
    }
}

/// Owns every child process; spawned once via [`spawn_actor`].
struct Actor {
    services: HashMap<String, Runtime>,
    ports: PortRegistry,
    rx: mpsc::Receiver<Command>,
    self_tx: mpsc::Sender<Command>,
}

/// Spawn the Supervisor actor task and return a handle to it. `ports` is
/// consulted for each service's assigned port so its watcher can confirm
/// the service actually bound it before marking it RUNNING; a service
/// absent from `ports` is readiness-checked on pid-liveness alone.
pub fn spawn_actor(manifest: &ServiceManifest, ports: PortRegistry) -> SupervisorHandle {
    let (tx, rx) = mpsc::channel(256);
    let services = manifest
        .all()
        .iter()
        .cloned()
        .map(|record| (record.name.clone(), Runtime::new(record)))
        .collect();

    let actor = Actor {
        services,
        ports,
        rx,
        self_tx: tx.clone(),
    };
    tokio::spawn(actor.run());
    SupervisorHandle { tx }
}

impl Actor {
    async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                Command::Start { name, reply } => {
                    let _ = reply.send(self.do_start(&name));
                }
                Command::Stop { name, reply } => {
                    let _ = reply.send(self.do_stop(&name).await);
                }
                Command::Restart { name, reply } => {
                    let result = match self.do_stop(&name).await {
                        Ok(()) => self.do_start(&name),
                        Err(err) => Err(err),
                    };
                    let _ = reply.send(result);
                }
                Command::Status { name, reply } => {
                    let result = self
                        .services
                        .get(&name)
                        .map(|r| r.state.clone())
                        .ok_or_else(|| SupervisorError::UnknownService(name.clone()));
                    let _ = reply.send(result);
                }
                Command::List { reply } => {
                    let mut states: Vec<ServiceState> =
                        self.services.values().map(|r| r.state.clone()).collect();
                    states.sort_by(|a, b| a.name.cmp(&b.name));
                    let _ = reply.send(states);
                }
                Command::MarkRunning(name) => {
                    if let Some(runtime) = self.services.get_mut(&name) {
                        if runtime.state.status == ServiceStatus::Starting
                            || runtime.state.status == ServiceStatus::Restarting
                        {
                            runtime.state.status = ServiceStatus::Running;
                            runtime.tracker.mark_running(chrono::Utc::now());
                            info!(service = %name, "service reached RUNNING");
                        }
                    }
                }
                Command::ChildExited { name, status } => {
                    self.on_child_exited(&name, status);
                }
            }
        }
    }

    fn do_start(&mut self, name: &str) -> Result<()> {
        let runtime = self
            .services
            .get_mut(name)
            .ok_or_else(|| SupervisorError::UnknownService(name.to_string()))?;

        if runtime.is_running() {
            return Err(SupervisorError::AlreadyRunning(name.to_string()));
        }

        let child = process::spawn(&runtime.record).map_err(|source| SupervisorError::Spawn {
            name: name.to_string(),
            source,
        })?;
        let pid = child.id();

        runtime.stopping = false;
        runtime.state.pid = pid;
        runtime.state.status = ServiceStatus::Starting;
        runtime.state.last_exit_reason = None;

        let port = self
            .ports
            .get_assignment(name)
            .ok()
            .map(|assignment| (assignment.host, assignment.port));

        spawn_watcher(name.to_string(), child, port, self.self_tx.clone());
        info!(service = %name, pid = ?pid, "service starting");
        Ok(())
    }

    async fn do_stop(&mut self, name: &str) -> Result<()> {
        let runtime = self
            .services
            .get_mut(name)
            .ok_or_else(|| SupervisorError::UnknownService(name.to_string()))?;

        if !runtime.is_running() {
            return Err(SupervisorError::NotRunning(name.to_string()));
        }

        let pid = runtime
            .state
            .pid
            .ok_or_else(|| SupervisorError::NotRunning(name.to_string()))?;

        runtime.stopping = true;
        process::signal_group(pid as i32, libc::SIGTERM).ok();
        runtime.state.status = ServiceStatus::Stopped;
        info!(service = %name, pid, "service stop requested");
        Ok(())
    }

    fn on_child_exited(&mut self, name: &str, status: std::io::Result<ExitStatus>) {
        let now = chrono::Utc::now();
        let Some(runtime) = self.services.get_mut(name) else {
            return;
        };

        let reason = match &status {
            Ok(exit) => exit.to_string(),
            Err(err) => err.to_string(),
        };
        runtime.state.last_exit_reason = Some(reason.clone());
        runtime.state.pid = None;

        if runtime.stopping {
            runtime.state.status = ServiceStatus::Stopped;
            runtime.stopping = false;
            return;
        }

        if !runtime.record.autorestart {
            warn!(service = %name, reason = %reason, "service exited, autorestart disabled");
            runtime.state.status = ServiceStatus::Stopped;
            return;
        }

        let count = runtime.tracker.record_exit(now);
        runtime.state.restart_count = count;

        if runtime.tracker.exhausted(runtime.record.startretries) {
            error!(service = %name, restarts = count, "service exhausted restart budget, going FATAL");
            runtime.state.status = ServiceStatus::Fatal;
            return;
        }

        warn!(service = %name, restarts = count, reason = %reason, "service crashed, restarting");
        runtime.state.status = ServiceStatus::Restarting;
        if let Err(err) = self.do_start(name) {
            error!(service = %name, error = %err, "restart attempt failed to spawn");
            if let Some(runtime) = self.services.get_mut(name) {
                runtime.state.status = ServiceStatus::Fatal;
            }
        }
    }
}

/// Readiness per §4.2/DESIGN.md §2.2: pid alive, and if a port was
/// assigned, that port accepting connections.
async fn probe_ready(pid: Option<u32>, port: &Option<(String, u16)>) -> bool {
    let pid_alive = match pid {
        Some(pid) => process::is_alive(pid as i32),
        None => false,
    };
    if !pid_alive {
        return false;
    }

    match port {
        Some((host, port)) => TcpStream::connect((host.as_str(), *port)).await.is_ok(),
        None => true,
    }
}

/// Wait on a child in its own task. After `STARTUP_GRACE`, polls readiness
/// (pid alive + port bound, if one is assigned) until it succeeds or
/// `READINESS_TIMEOUT` elapses, reporting RUNNING only once readiness is
/// confirmed. The child's exit is watched concurrently throughout so a
/// crash during readiness probing is still caught immediately.
fn spawn_watcher(
    name: String,
    mut child: tokio::process::Child,
    port: Option<(String, u16)>,
    tx: mpsc::Sender<Command>,
) {
    tokio::spawn(async move {
        let pid = child.id();

        tokio::select! {
            status = child.wait() => {
                let _ = tx.send(Command::ChildExited { name, status }).await;
                return;
            }
            _ = tokio::time::sleep(STARTUP_GRACE) => {}
        }

        let deadline = Instant::now() + READINESS_TIMEOUT;
        loop {
            tokio::select! {
                status = child.wait() => {
                    let _ = tx.send(Command::ChildExited { name, status }).await;
                    return;
                }
                ready = probe_ready(pid, &port) => {
                    if ready {
                        let _ = tx.send(Command::MarkRunning(name.clone())).await;
                        break;
                    }
                    if Instant::now() >= deadline {
                        warn!(service = %name, "service did not become ready (pid/port probe) within timeout");
                        break;
                    }
                    tokio::time::sleep(READINESS_POLL_INTERVAL).await;
                }
            }
        }

        // Keep watching for exit after readiness is settled (or abandoned).
        let status = child.wait().await;
        let _ = tx.send(Command::ChildExited { name, status }).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    use recconfig::PortManifest;

    fn sample_manifest() -> ServiceManifest {
        let json = r#"[
            {"name": "echoer", "command": "/bin/sh", "args": ["-c", "sleep 30"],
             "cwd": ".", "logfile": "echoer.log", "autostart": false}
        ]"#;
        ServiceManifest::parse(json).unwrap()
    }

    /// No services have assigned ports, so readiness falls back to
    /// pid-liveness alone for these tests.
    fn empty_ports() -> PortRegistry {
        PortRegistry::with_host(PortManifest::parse("{}").unwrap(), "localhost")
    }

    #[tokio::test]
    async fn test_start_then_status_reaches_running() {
        let manifest = sample_manifest();
        let handle = spawn_actor(&manifest, empty_ports());

        handle.start("echoer").await.unwrap();
        tokio::time::sleep(Duration::from_millis(700)).await;

        let status = handle.status("echoer").await.unwrap();
        assert_eq!(status.status, ServiceStatus::Running);

        handle.stop("echoer").await.unwrap();
    }

    #[tokio::test]
    async fn test_double_start_is_rejected() {
        let manifest = sample_manifest();
        let handle = spawn_actor(&manifest, empty_ports());

        handle.start("echoer").await.unwrap();
        let second = handle.start("echoer").await;
        assert!(second.is_err());

        handle.stop("echoer").await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_service_is_rejected() {
        let manifest = sample_manifest();
        let handle = spawn_actor(&manifest, empty_ports());
        assert!(handle.start("ghost").await.is_err());
        assert!(handle.status("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_list_returns_all_services_sorted() {
        let manifest = sample_manifest();
        let handle = spawn_actor(&manifest, empty_ports());
        let states = handle.list().await.unwrap();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].name, "echoer");
    }
}
