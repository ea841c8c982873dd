//! Error types for recconfig.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("port manifest is missing entry for service '{0}'")]
    MissingPort(String),

    #[error("service manifest is missing entry for service '{0}'")]
    MissingService(String),

    #[error("failed to read manifest file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("service dependency graph is invalid: {0}")]
    InvalidDependencyGraph(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
