//! Error types for TradeManager and TradeExecutor (spec.md §4.8-§4.9).

use thiserror::Error;

use reccore::TicketId;

/// TradeManager-level errors: everything short of an exchange call.
#[derive(Debug, Error)]
pub enum TradeError {
    #[error("store error: {0}")]
    Store(#[from] recstore::StoreError),

    #[error("no trade found with id {0}")]
    UnknownTrade(u64),

    #[error("executor queue rejected ticket {0}: {1}")]
    ExecutorRejected(TicketId, String),
}

pub type TradeResult<T> = Result<T, TradeError>;

/// TradeExecutor-level errors, classified per spec.md §7's error taxonomy
/// so the retry loop knows whether to back off or fail fast.
#[derive(Debug, Error, Clone)]
pub enum ExecutorError {
    #[error("transient exchange error: {0}")]
    Transient(String),

    #[error("permanent exchange error ({status}): {message}")]
    Permanent { status: u16, message: String },

    #[error("retry budget exhausted after {attempts} attempts: {last_error}")]
    RetryBudgetExhausted { attempts: u32, last_error: String },

    #[error("executor queue is shutting down")]
    QueueClosed,
}

impl ExecutorError {
    /// Permanent errors (4xx except 429) must not be retried (spec.md §7).
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent { .. })
    }

    /// Classify an HTTP response status into the transient/permanent split.
    /// 429 (rate limit) is transient despite being a 4xx.
    #[must_use]
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status.as_u16() == 429 || status.is_server_error() {
            Self::Transient(format!("HTTP {status}: {body}"))
        } else if status.is_client_error() {
            Self::Permanent {
                status: status.as_u16(),
                message: body,
            }
        } else {
            Self::Transient(format!("unexpected HTTP {status}: {body}"))
        }
    }
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_429_classified_transient() {
        let err = ExecutorError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down".into());
        assert!(!err.is_permanent());
    }

    #[test]
    fn test_404_classified_permanent() {
        let err = ExecutorError::from_status(reqwest::StatusCode::NOT_FOUND, "no such order".into());
        assert!(err.is_permanent());
    }

    #[test]
    fn test_500_classified_transient() {
        let err = ExecutorError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "oops".into());
        assert!(!err.is_permanent());
    }
}
