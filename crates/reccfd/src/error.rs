//! Error types for reccfd.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CfdError {
    #[error("supervisor request failed: {0}")]
    SupervisorRequest(#[from] reqwest::Error),

    #[error("supervisor returned an error status for '{service}': {status}")]
    SupervisorStatus { service: String, status: u16 },
}

pub type Result<T> = std::result::Result<T, CfdError>;
