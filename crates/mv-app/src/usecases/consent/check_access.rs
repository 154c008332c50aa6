use std::sync::Arc;

use tracing::debug;

use mv_core::consent::ConsentError;
use mv_core::identity::StaffIdentity;
use mv_core::ids::{HospitalId, PatientId, StaffId};
use mv_core::ports::GrantLedgerPort;

/// Answers whether a staff member at a hospital holds a grant for a patient.
///
/// Consults the ledger on every call; there is no cache.
pub struct CheckAccess {
    grants: Arc<dyn GrantLedgerPort>,
}

impl CheckAccess {
    pub fn new(grants: Arc<dyn GrantLedgerPort>) -> Self {
        Self { grants }
    }

    #[tracing::instrument(
        name = "usecase.check_access.execute",
        skip(self),
        fields(patient_id = %patient_id, hospital_id = %hospital_id, staff_id = %staff_id)
    )]
    pub async fn execute(
        &self,
        patient_id: &PatientId,
        hospital_id: &HospitalId,
        staff_id: &StaffId,
    ) -> Result<bool, ConsentError> {
        // Issuance rejects blank ids, so no grant can cover such a tuple.
        if patient_id.is_blank() || hospital_id.is_blank() || staff_id.is_blank() {
            debug!("Blank id in access check, no grant possible");
            return Ok(false);
        }

        let granted = self
            .grants
            .has_grant(patient_id, hospital_id, staff_id)
            .await?;
        debug!(granted, "Grant lookup finished");
        Ok(granted)
    }

    /// Same check with the tuple taken from an authenticated identity.
    pub async fn for_staff(
        &self,
        staff: &StaffIdentity,
        patient_id: &PatientId,
    ) -> Result<bool, ConsentError> {
        self.execute(patient_id, &staff.hospital_id, &staff.staff_id)
            .await
    }
}
