use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChallengeStoreError {
    /// Another pending challenge already holds the code.
    #[error("code already pending")]
    CodeConflict,

    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Error)]
pub enum GrantLedgerError {
    #[error("storage error: {0}")]
    Storage(String),
}
