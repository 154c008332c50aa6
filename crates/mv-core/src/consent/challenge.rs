use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::{ConsentError, OtpCode};
use crate::identity::StaffIdentity;
use crate::ids::{ChallengeId, HospitalId, PatientId, StaffId};

/// A hospital's request to view a patient's records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRequest {
    pub patient_id: PatientId,
    pub hospital_id: HospitalId,
    pub staff_id: StaffId,
}

impl ChallengeRequest {
    pub fn new(
        patient_id: impl Into<PatientId>,
        hospital_id: impl Into<HospitalId>,
        staff_id: impl Into<StaffId>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            hospital_id: hospital_id.into(),
            staff_id: staff_id.into(),
        }
    }

    pub fn from_staff(patient_id: impl Into<PatientId>, staff: &StaffIdentity) -> Self {
        Self {
            patient_id: patient_id.into(),
            hospital_id: staff.hospital_id.clone(),
            staff_id: staff.staff_id.clone(),
        }
    }

    /// Rejects blank identifiers, reporting the first missing field.
    pub fn validate(self) -> Result<Self, ConsentError> {
        if self.patient_id.is_blank() {
            return Err(ConsentError::missing("patient_id"));
        }
        if self.hospital_id.is_blank() {
            return Err(ConsentError::missing("hospital_id"));
        }
        if self.staff_id.is_blank() {
            return Err(ConsentError::missing("staff_id"));
        }
        Ok(self)
    }
}

/// Why a challenge left the pending state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumedReason {
    Redeemed,
    Expired,
}

impl ConsumedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumedReason::Redeemed => "redeemed",
            ConsumedReason::Expired => "expired",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "redeemed" => Some(ConsumedReason::Redeemed),
            "expired" => Some(ConsumedReason::Expired),
            _ => None,
        }
    }
}

/// One pending or resolved authorization attempt.
///
/// Once `consumed` is set the row is never modified again; consumed
/// challenges are kept as an audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub code: OtpCode,
    pub patient_id: PatientId,
    pub hospital_id: HospitalId,
    pub staff_id: StaffId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed: bool,
    pub consumed_at: Option<DateTime<Utc>>,
    pub consumed_reason: Option<ConsumedReason>,
}

impl Challenge {
    /// A fresh pending challenge expiring `ttl` after `now`.
    pub fn issue(
        id: ChallengeId,
        code: OtpCode,
        request: &ChallengeRequest,
        now: DateTime<Utc>,
        ttl: TimeDelta,
    ) -> Self {
        Self {
            id,
            code,
            patient_id: request.patient_id.clone(),
            hospital_id: request.hospital_id.clone(),
            staff_id: request.staff_id.clone(),
            created_at: now,
            expires_at: now + ttl,
            consumed: false,
            consumed_at: None,
            consumed_reason: None,
        }
    }

    /// Expired strictly after `expires_at`; the boundary instant is still valid.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && !self.is_expired_at(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request() -> ChallengeRequest {
        ChallengeRequest::new("p1", "h1", "s1")
    }

    fn issued_at(now: DateTime<Utc>) -> Challenge {
        Challenge::issue(
            ChallengeId::from("c1"),
            OtpCode::from_stored("123456".to_string()),
            &request(),
            now,
            TimeDelta::minutes(10),
        )
    }

    #[test]
    fn test_validate_reports_first_missing_field() {
        let err = ChallengeRequest::new("", "h1", "s1").validate().unwrap_err();
        assert_eq!(err, ConsentError::Validation("patient_id required".into()));

        let err = ChallengeRequest::new("p1", " ", "s1").validate().unwrap_err();
        assert_eq!(err, ConsentError::Validation("hospital_id required".into()));

        let err = ChallengeRequest::new("p1", "h1", "").validate().unwrap_err();
        assert_eq!(err, ConsentError::Validation("staff_id required".into()));

        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_from_staff_copies_identity() {
        let staff =
            StaffIdentity::new("s9", "h9", crate::identity::StaffRole::Staff).unwrap();
        let req = ChallengeRequest::from_staff("p1", &staff);
        assert_eq!(req.hospital_id.as_str(), "h9");
        assert_eq!(req.staff_id.as_str(), "s9");
    }

    #[test]
    fn test_issue_sets_expiry_from_ttl() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let challenge = issued_at(now);
        assert_eq!(challenge.expires_at - challenge.created_at, TimeDelta::minutes(10));
        assert!(!challenge.consumed);
        assert!(challenge.consumed_reason.is_none());
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let challenge = issued_at(now);

        assert!(challenge.is_redeemable_at(now + TimeDelta::minutes(10)));
        assert!(challenge.is_expired_at(now + TimeDelta::minutes(11)));
        assert!(!challenge.is_redeemable_at(now + TimeDelta::minutes(11)));
    }

    #[test]
    fn test_consumed_reason_round_trip() {
        for reason in [ConsumedReason::Redeemed, ConsumedReason::Expired] {
            assert_eq!(ConsumedReason::parse(reason.as_str()), Some(reason));
        }
        assert_eq!(ConsumedReason::parse("deleted"), None);
    }
}
