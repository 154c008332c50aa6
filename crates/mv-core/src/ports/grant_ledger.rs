use async_trait::async_trait;

use super::errors::GrantLedgerError;
use crate::consent::AccessGrant;
use crate::ids::{ChallengeId, HospitalId, PatientId, StaffId};

/// Read side of the grant ledger. Grants are only written by redemption.
#[async_trait]
pub trait GrantLedgerPort: Send + Sync {
    async fn has_grant(
        &self,
        patient_id: &PatientId,
        hospital_id: &HospitalId,
        staff_id: &StaffId,
    ) -> Result<bool, GrantLedgerError>;

    /// Grants recorded for a patient, newest first.
    async fn list_for_patient(
        &self,
        patient_id: &PatientId,
    ) -> Result<Vec<AccessGrant>, GrantLedgerError>;

    async fn find_by_challenge(
        &self,
        challenge_id: &ChallengeId,
    ) -> Result<Option<AccessGrant>, GrantLedgerError>;
}
