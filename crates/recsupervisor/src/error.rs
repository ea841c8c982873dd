//! Error types for recsupervisor.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Config(#[from] recconfig::ConfigError),

    #[error("unknown service '{0}'")]
    UnknownService(String),

    #[error("service '{0}' is already running")]
    AlreadyRunning(String),

    #[error("service '{0}' is not running")]
    NotRunning(String),

    #[error("failed to spawn process for '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("control channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
