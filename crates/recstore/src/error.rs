//! Store error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error("invalid user id '{0}': must be lowercase alphanumeric/underscore")]
    InvalidUserId(String),

    #[error("invalid symbol '{0}': must be lowercase alphanumeric/underscore")]
    InvalidSymbol(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
