use thiserror::Error;

use crate::ports::{ChallengeStoreError, GrantLedgerError};

/// Errors surfaced by the consent exchange.
///
/// `Validation`, `NotFound` and `Expired` are terminal and safe to show to the
/// caller verbatim. `Storage` is transient: no partial state exists when it is
/// returned, so the whole operation may be retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsentError {
    #[error("{0}")]
    Validation(String),

    #[error("invalid code")]
    NotFound,

    #[error("code expired")]
    Expired,

    #[error("storage error: {0}")]
    Storage(String),
}

impl ConsentError {
    pub fn missing(field: &str) -> Self {
        ConsentError::Validation(format!("{field} required"))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ConsentError::Storage(_))
    }
}

impl From<ChallengeStoreError> for ConsentError {
    fn from(err: ChallengeStoreError) -> Self {
        ConsentError::Storage(err.to_string())
    }
}

impl From<GrantLedgerError> for ConsentError {
    fn from(err: GrantLedgerError) -> Self {
        ConsentError::Storage(err.to_string())
    }
}
