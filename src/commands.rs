//! Command handlers behind the `medivault` binary.
//!
//! Each handler runs one use case and returns a serializable view. Printing and
//! exit codes are left to `main`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mv_app::PendingRequest;
use mv_core::consent::{AccessGrant, ChallengeRequest, ConsentError, OtpCode};
use mv_core::identity::{StaffIdentity, StaffRole};
use mv_core::ids::{ChallengeId, GrantId, HospitalId, PatientId, StaffId};

use crate::bootstrap::ConsentRuntime;

#[derive(Debug, Clone, Serialize)]
pub struct IssuedChallenge {
    pub challenge_id: ChallengeId,
    pub code: OtpCode,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantView {
    pub grant_id: GrantId,
    pub challenge_id: ChallengeId,
    pub patient_id: PatientId,
    pub hospital_id: HospitalId,
    pub staff_id: StaffId,
    pub created_at: DateTime<Utc>,
}

impl From<AccessGrant> for GrantView {
    fn from(grant: AccessGrant) -> Self {
        Self {
            grant_id: grant.id,
            challenge_id: grant.challenge_id,
            patient_id: grant.patient_id,
            hospital_id: grant.hospital_id,
            staff_id: grant.staff_id,
            created_at: grant.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GrantAnswer {
    pub granted: bool,
}

/// What a staff member may do with a patient's records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccessReport {
    pub can_view: bool,
    pub can_add: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_edit: Option<bool>,
}

/// Error body printed on stdout when a command fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl From<&ConsentError> for ErrorBody {
    fn from(err: &ConsentError) -> Self {
        let error = match err {
            ConsentError::Validation(_) => "validation",
            ConsentError::NotFound => "not_found",
            ConsentError::Expired => "expired",
            ConsentError::Storage(_) => "storage",
        };
        Self {
            error,
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// Process exit status for a failed command: 1 for storage faults, 2 for
/// errors the caller has to fix.
pub fn exit_status(err: &ConsentError) -> u8 {
    if err.is_retryable() {
        1
    } else {
        2
    }
}

pub async fn issue(
    runtime: &ConsentRuntime,
    patient_id: &str,
    hospital_id: &str,
    staff_id: &str,
) -> Result<IssuedChallenge, ConsentError> {
    let challenge = runtime
        .issue_challenge
        .execute(ChallengeRequest::new(patient_id, hospital_id, staff_id))
        .await?;
    Ok(IssuedChallenge {
        challenge_id: challenge.id,
        code: challenge.code,
        expires_at: challenge.expires_at,
    })
}

pub async fn redeem(runtime: &ConsentRuntime, code: &str) -> Result<GrantView, ConsentError> {
    runtime
        .redeem_challenge
        .execute(code)
        .await
        .map(GrantView::from)
}

pub async fn has_grant(
    runtime: &ConsentRuntime,
    patient_id: &str,
    hospital_id: &str,
    staff_id: &str,
) -> Result<GrantAnswer, ConsentError> {
    let granted = runtime
        .check_access
        .execute(
            &PatientId::from(patient_id),
            &HospitalId::from(hospital_id),
            &StaffId::from(staff_id),
        )
        .await?;
    Ok(GrantAnswer { granted })
}

pub async fn pending(
    runtime: &ConsentRuntime,
    patient_id: &str,
) -> Result<Vec<PendingRequest>, ConsentError> {
    runtime
        .list_pending
        .execute(&PatientId::from(patient_id))
        .await
}

pub async fn grants(
    runtime: &ConsentRuntime,
    patient_id: &str,
) -> Result<Vec<GrantView>, ConsentError> {
    let grants = runtime
        .list_grants
        .execute(&PatientId::from(patient_id))
        .await?;
    Ok(grants.into_iter().map(GrantView::from).collect())
}

/// Evaluates the record access policy for a staff member.
///
/// `role_code` is the identity provider's numeric role. `can_edit` is only
/// answered when the hospital that wrote the record is given.
pub async fn access(
    runtime: &ConsentRuntime,
    staff_id: &str,
    hospital_id: &str,
    role_code: i32,
    patient_id: &str,
    record_hospital_id: Option<&str>,
) -> Result<AccessReport, ConsentError> {
    let staff = StaffIdentity::new(staff_id, hospital_id, StaffRole::from_code(role_code))?;
    let patient_id = PatientId::from(patient_id);
    let policy = &runtime.record_access;

    let can_edit = match record_hospital_id {
        Some(record_hospital) => Some(
            policy
                .can_edit_record(&staff, &patient_id, &HospitalId::from(record_hospital))
                .await?,
        ),
        None => None,
    };

    Ok(AccessReport {
        can_view: policy.can_view_records(&staff, &patient_id).await?,
        can_add: policy.can_add_record(&staff, &patient_id).await?,
        can_edit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body_kinds() {
        let body = ErrorBody::from(&ConsentError::NotFound);
        assert_eq!(body.error, "not_found");
        assert_eq!(body.message, "invalid code");
        assert!(!body.retryable);

        let body = ErrorBody::from(&ConsentError::Storage("database is locked".into()));
        assert_eq!(body.error, "storage");
        assert!(body.retryable);
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(&ConsentError::Expired), 2);
        assert_eq!(exit_status(&ConsentError::missing("code")), 2);
        assert_eq!(exit_status(&ConsentError::Storage("busy".into())), 1);
    }
}
