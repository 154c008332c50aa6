use std::sync::Arc;

use mv_core::consent::{AccessGrant, ConsentError};
use mv_core::ids::PatientId;
use mv_core::ports::GrantLedgerPort;

/// Grants recorded for a patient, newest first.
pub struct ListPatientGrants {
    grants: Arc<dyn GrantLedgerPort>,
}

impl ListPatientGrants {
    pub fn new(grants: Arc<dyn GrantLedgerPort>) -> Self {
        Self { grants }
    }

    #[tracing::instrument(
        name = "usecase.list_patient_grants.execute",
        skip(self),
        fields(patient_id = %patient_id)
    )]
    pub async fn execute(&self, patient_id: &PatientId) -> Result<Vec<AccessGrant>, ConsentError> {
        if patient_id.is_blank() {
            return Err(ConsentError::missing("patient_id"));
        }
        Ok(self.grants.list_for_patient(patient_id).await?)
    }
}
