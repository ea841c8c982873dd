//! Application error type shared by every `recbot` binary.
//!
//! Each binary's `main()` returns `anyhow::Result<()>`, so this enum only
//! needs to implement `std::error::Error` (via `thiserror`) for `?` to
//! convert through it at the `main()` boundary — nothing here is meant to
//! be matched on by callers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] recconfig::ConfigError),

    #[error(transparent)]
    Store(#[from] recstore::StoreError),

    #[error(transparent)]
    Feed(#[from] recfeed::FeedError),

    #[error(transparent)]
    Account(#[from] recaccount::AccountError),

    #[error(transparent)]
    Trade(#[from] rectrade::TradeError),

    #[error(transparent)]
    Executor(#[from] rectrade::ExecutorError),

    #[error(transparent)]
    Ats(#[from] recats::AtsError),

    #[error(transparent)]
    Entry(#[from] recentry::EntryError),

    #[error(transparent)]
    Cfd(#[from] reccfd::CfdError),

    #[error(transparent)]
    Telemetry(#[from] rectelemetry::TelemetryError),

    #[error(transparent)]
    Supervisor(#[from] recsupervisor::SupervisorError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type AppResult<T> = Result<T, AppError>;
