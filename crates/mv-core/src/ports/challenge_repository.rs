use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::errors::ChallengeStoreError;
use crate::consent::{AccessGrant, Challenge, OtpCode};
use crate::ids::{ChallengeId, GrantId, PatientId};

/// Result of one atomic redemption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedemptionOutcome {
    /// The challenge was consumed and the grant recorded in the same transaction.
    Granted(AccessGrant),
    /// The code matched a pending challenge past its expiry; it is now retired.
    Expired(ChallengeId),
    /// No pending challenge holds the code.
    NotFound,
}

/// Durable store of challenges.
///
/// Implementations must serialize [`redeem`](Self::redeem) at the storage
/// layer: for one pending code, exactly one concurrent call may observe
/// `Granted`, even across processes.
#[async_trait]
pub trait ChallengeRepositoryPort: Send + Sync {
    /// Persists a new pending challenge.
    ///
    /// Returns [`ChallengeStoreError::CodeConflict`] when a non-expired pending
    /// challenge already holds the same code.
    async fn insert_pending(&self, challenge: &Challenge) -> Result<(), ChallengeStoreError>;

    /// Consumes the pending challenge holding `code` and records a grant with id
    /// `grant_id` as one atomic unit.
    async fn redeem(
        &self,
        code: &OtpCode,
        grant_id: &GrantId,
        now: DateTime<Utc>,
    ) -> Result<RedemptionOutcome, ChallengeStoreError>;

    async fn find_by_id(
        &self,
        id: &ChallengeId,
    ) -> Result<Option<Challenge>, ChallengeStoreError>;

    /// Pending, unexpired challenges for a patient, newest first.
    async fn list_pending_for_patient(
        &self,
        patient_id: &PatientId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Challenge>, ChallengeStoreError>;
}
