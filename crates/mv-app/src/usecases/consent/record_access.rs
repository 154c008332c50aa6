//! Authorization gate for the record features.
//!
//! Reading and adding records requires a grant for the caller's
//! (patient, hospital, staff) tuple. Amending a record additionally requires a
//! privileged role at the hospital where the record was written.

use std::sync::Arc;

use tracing::debug;

use mv_core::consent::ConsentError;
use mv_core::identity::StaffIdentity;
use mv_core::ids::{HospitalId, PatientId};
use mv_core::ports::GrantLedgerPort;

use super::CheckAccess;

pub struct RecordAccessPolicy {
    access: CheckAccess,
}

impl RecordAccessPolicy {
    pub fn new(grants: Arc<dyn GrantLedgerPort>) -> Self {
        Self {
            access: CheckAccess::new(grants),
        }
    }

    pub async fn can_view_records(
        &self,
        staff: &StaffIdentity,
        patient_id: &PatientId,
    ) -> Result<bool, ConsentError> {
        self.access.for_staff(staff, patient_id).await
    }

    pub async fn can_add_record(
        &self,
        staff: &StaffIdentity,
        patient_id: &PatientId,
    ) -> Result<bool, ConsentError> {
        self.access.for_staff(staff, patient_id).await
    }

    pub async fn can_edit_record(
        &self,
        staff: &StaffIdentity,
        patient_id: &PatientId,
        record_hospital_id: &HospitalId,
    ) -> Result<bool, ConsentError> {
        if !staff.role.is_privileged() || !staff.works_at(record_hospital_id) {
            debug!(
                staff_id = %staff.staff_id,
                role = ?staff.role,
                record_hospital_id = %record_hospital_id,
                "Record edit denied by role or hospital"
            );
            return Ok(false);
        }
        self.access.for_staff(staff, patient_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::consent::test_support::{t0, FixedClock, InMemoryConsentStore};
    use crate::usecases::consent::RedeemChallenge;
    use chrono::TimeDelta;
    use mv_core::consent::{Challenge, ChallengeRequest, OtpCode};
    use mv_core::identity::StaffRole;
    use mv_core::ids::ChallengeId;
    use mv_core::ports::ChallengeRepositoryPort;

    async fn granted_store(staff_id: &str) -> Arc<InMemoryConsentStore> {
        let store = InMemoryConsentStore::new();
        let challenge = Challenge::issue(
            ChallengeId::from("c1"),
            OtpCode::from_stored("123456".to_string()),
            &ChallengeRequest::new("p1", "h1", staff_id),
            t0(),
            TimeDelta::minutes(10),
        );
        store.insert_pending(&challenge).await.unwrap();
        RedeemChallenge::new(store.clone(), FixedClock::at(t0()))
            .execute("123456")
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_grant_allows_view_and_add() {
        let policy = RecordAccessPolicy::new(granted_store("s1").await);
        let nurse = StaffIdentity::new("s1", "h1", StaffRole::Staff).unwrap();
        let patient = PatientId::from("p1");

        assert!(policy.can_view_records(&nurse, &patient).await.unwrap());
        assert!(policy.can_add_record(&nurse, &patient).await.unwrap());
    }

    #[tokio::test]
    async fn test_without_grant_nothing_is_allowed() {
        let policy = RecordAccessPolicy::new(InMemoryConsentStore::new());
        let doctor = StaffIdentity::new("s1", "h1", StaffRole::Doctor).unwrap();
        let patient = PatientId::from("p1");
        let h1 = HospitalId::from("h1");

        assert!(!policy.can_view_records(&doctor, &patient).await.unwrap());
        assert!(!policy.can_add_record(&doctor, &patient).await.unwrap());
        assert!(!policy.can_edit_record(&doctor, &patient, &h1).await.unwrap());
    }

    #[tokio::test]
    async fn test_edit_requires_doctor_at_record_hospital() {
        let patient = PatientId::from("p1");
        let h1 = HospitalId::from("h1");
        let h2 = HospitalId::from("h2");

        let policy = RecordAccessPolicy::new(granted_store("s1").await);
        let doctor = StaffIdentity::new("s1", "h1", StaffRole::Doctor).unwrap();
        assert!(policy.can_edit_record(&doctor, &patient, &h1).await.unwrap());
        assert!(!policy.can_edit_record(&doctor, &patient, &h2).await.unwrap());

        let nurse = StaffIdentity::new("s1", "h1", StaffRole::Staff).unwrap();
        assert!(!policy.can_edit_record(&nurse, &patient, &h1).await.unwrap());

        let admin = StaffIdentity::new("s1", "h1", StaffRole::Admin).unwrap();
        assert!(!policy.can_edit_record(&admin, &patient, &h1).await.unwrap());
    }
}
