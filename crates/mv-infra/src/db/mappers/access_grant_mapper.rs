use crate::db::mappers::millis_to_utc;
use crate::db::models::AccessGrantRow;
use crate::db::ports::RowMapper;
use anyhow::Result;
use mv_core::consent::AccessGrant;
use mv_core::ids::{ChallengeId, GrantId, HospitalId, PatientId, StaffId};

/// Grants are only ever written by redemption, so there is no insert mapping.
pub struct AccessGrantRowMapper;

impl RowMapper<AccessGrantRow, AccessGrant> for AccessGrantRowMapper {
    fn to_domain(&self, row: &AccessGrantRow) -> Result<AccessGrant> {
        Ok(AccessGrant {
            id: GrantId::from(row.id.as_str()),
            challenge_id: ChallengeId::from(row.challenge_id.as_str()),
            patient_id: PatientId::from(row.patient_id.as_str()),
            hospital_id: HospitalId::from(row.hospital_id.as_str()),
            staff_id: StaffId::from(row.staff_id.as_str()),
            created_at: millis_to_utc(row.created_at_ms, "created_at_ms")?,
        })
    }
}
