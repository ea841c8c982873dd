//! AutoEntryEngine error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntryError {
    #[error("store error: {0}")]
    Store(#[from] recstore::StoreError),

    #[error("entry intent for {0} rejected: {1}")]
    EntryRejected(String, String),
}

pub type EntryResult<T> = Result<T, EntryError>;
