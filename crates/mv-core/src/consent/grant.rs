use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ChallengeId, GrantId, HospitalId, PatientId, StaffId};

/// Durable proof that a staff member at a hospital may view a patient's records.
///
/// Only created by a successful redemption; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub id: GrantId,
    /// The challenge whose redemption produced this grant.
    pub challenge_id: ChallengeId,
    pub patient_id: PatientId,
    pub hospital_id: HospitalId,
    pub staff_id: StaffId,
    pub created_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn covers(
        &self,
        patient_id: &PatientId,
        hospital_id: &HospitalId,
        staff_id: &StaffId,
    ) -> bool {
        &self.patient_id == patient_id
            && &self.hospital_id == hospital_id
            && &self.staff_id == staff_id
    }
}
