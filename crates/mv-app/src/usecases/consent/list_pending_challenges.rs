use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use mv_core::consent::{Challenge, ConsentError, OtpCode};
use mv_core::ids::{ChallengeId, HospitalId, PatientId, StaffId};
use mv_core::ports::{ChallengeRepositoryPort, ClockPort};

/// One open access request as shown to the patient.
///
/// This is the channel through which the patient learns the code, so unlike
/// every other view it carries it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingRequest {
    pub challenge_id: ChallengeId,
    pub code: OtpCode,
    pub hospital_id: HospitalId,
    pub staff_id: StaffId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<Challenge> for PendingRequest {
    fn from(challenge: Challenge) -> Self {
        Self {
            challenge_id: challenge.id,
            code: challenge.code,
            hospital_id: challenge.hospital_id,
            staff_id: challenge.staff_id,
            created_at: challenge.created_at,
            expires_at: challenge.expires_at,
        }
    }
}

/// Unconsumed, unexpired challenges for a patient, newest first.
pub struct ListPendingChallenges {
    challenges: Arc<dyn ChallengeRepositoryPort>,
    clock: Arc<dyn ClockPort>,
}

impl ListPendingChallenges {
    pub fn new(challenges: Arc<dyn ChallengeRepositoryPort>, clock: Arc<dyn ClockPort>) -> Self {
        Self { challenges, clock }
    }

    #[tracing::instrument(
        name = "usecase.list_pending_challenges.execute",
        skip(self),
        fields(patient_id = %patient_id)
    )]
    pub async fn execute(
        &self,
        patient_id: &PatientId,
    ) -> Result<Vec<PendingRequest>, ConsentError> {
        if patient_id.is_blank() {
            return Err(ConsentError::missing("patient_id"));
        }

        let pending = self
            .challenges
            .list_pending_for_patient(patient_id, self.clock.now())
            .await?;
        Ok(pending.into_iter().map(PendingRequest::from).collect())
    }
}
