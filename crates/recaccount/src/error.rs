//! AccountSync error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Kalshi auth error: {0}")]
    Auth(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Store error: {0}")]
    Store(#[from] recstore::StoreError),
}

pub type AccountResult<T> = Result<T, AccountError>;
