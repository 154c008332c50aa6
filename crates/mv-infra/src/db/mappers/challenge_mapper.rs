use crate::db::mappers::millis_to_utc;
use crate::db::models::{ChallengeRow, NewChallengeRow};
use crate::db::ports::{InsertMapper, RowMapper};
use anyhow::{anyhow, Result};
use mv_core::consent::{Challenge, ConsumedReason, OtpCode};
use mv_core::ids::{ChallengeId, HospitalId, PatientId, StaffId};

pub struct ChallengeRowMapper;

impl InsertMapper<Challenge, NewChallengeRow> for ChallengeRowMapper {
    fn to_row(&self, domain: &Challenge) -> Result<NewChallengeRow> {
        if domain.consumed {
            return Err(anyhow!(
                "challenge {} is already consumed and cannot be inserted as pending",
                domain.id
            ));
        }
        Ok(NewChallengeRow {
            id: domain.id.as_str().to_string(),
            code: domain.code.as_str().to_string(),
            patient_id: domain.patient_id.as_str().to_string(),
            hospital_id: domain.hospital_id.as_str().to_string(),
            staff_id: domain.staff_id.as_str().to_string(),
            created_at_ms: domain.created_at.timestamp_millis(),
            expires_at_ms: domain.expires_at.timestamp_millis(),
            consumed: false,
        })
    }
}

impl RowMapper<ChallengeRow, Challenge> for ChallengeRowMapper {
    fn to_domain(&self, row: &ChallengeRow) -> Result<Challenge> {
        let consumed_at = match row.consumed_at_ms {
            Some(ms) => Some(millis_to_utc(ms, "consumed_at_ms")?),
            None => None,
        };
        let consumed_reason = match row.consumed_reason.as_deref() {
            Some(value) => Some(
                ConsumedReason::parse(value)
                    .ok_or_else(|| anyhow!("invalid consumed_reason: {}", value))?,
            ),
            None => None,
        };

        Ok(Challenge {
            id: ChallengeId::from(row.id.as_str()),
            code: OtpCode::from_stored(row.code.clone()),
            patient_id: PatientId::from(row.patient_id.as_str()),
            hospital_id: HospitalId::from(row.hospital_id.as_str()),
            staff_id: StaffId::from(row.staff_id.as_str()),
            created_at: millis_to_utc(row.created_at_ms, "created_at_ms")?,
            expires_at: millis_to_utc(row.expires_at_ms, "expires_at_ms")?,
            consumed: row.consumed,
            consumed_at,
            consumed_reason,
        })
    }
}
