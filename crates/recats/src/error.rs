//! ActiveTradeSupervisor error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtsError {
    #[error("store error: {0}")]
    Store(#[from] recstore::StoreError),

    #[error("close intent for trade {0} rejected: {1}")]
    CloseRejected(u64, String),
}

pub type AtsResult<T> = Result<T, AtsError>;
