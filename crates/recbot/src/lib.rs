//! Binary-wiring crate for the REC.IO trading core (spec.md §4).
//!
//! Each `src/bin/*.rs` target is one long-running service process the
//! Supervisor manages; this crate holds what's shared across them —
//! configuration loading (`config`), the error type every binary's
//! `main()` converts into `anyhow::Error` at its boundary (`error`), the
//! `GET /healthz` surface every binary serves (`health`), and the HTTP
//! seam `active_trade_supervisor`/`auto_entry_supervisor` use to reach a
//! standalone `trade_manager` process (`rpc`).

pub mod config;
pub mod error;
pub mod health;
pub mod rpc;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
