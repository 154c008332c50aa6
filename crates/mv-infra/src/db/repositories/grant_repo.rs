use async_trait::async_trait;
use diesel::prelude::*;
use tracing::debug_span;

use mv_core::consent::AccessGrant;
use mv_core::ids::{ChallengeId, HospitalId, PatientId, StaffId};
use mv_core::ports::{GrantLedgerError, GrantLedgerPort};

use crate::db::models::AccessGrantRow;
use crate::db::ports::{DbExecutor, RowMapper};
use crate::db::schema::access_grants;

/// Grant Ledger. Read-only here; rows are written by challenge redemption.
pub struct DieselGrantLedger<E, M> {
    executor: E,
    mapper: M,
}

impl<E, M> DieselGrantLedger<E, M> {
    pub fn new(executor: E, mapper: M) -> Self {
        Self { executor, mapper }
    }
}

#[async_trait]
impl<E, M> GrantLedgerPort for DieselGrantLedger<E, M>
where
    E: DbExecutor,
    M: RowMapper<AccessGrantRow, AccessGrant>,
{
    async fn has_grant(
        &self,
        patient_id: &PatientId,
        hospital_id: &HospitalId,
        staff_id: &StaffId,
    ) -> Result<bool, GrantLedgerError> {
        let span = debug_span!(
            "infra.sqlite.has_grant",
            table = "access_grants",
            patient_id = %patient_id,
            hospital_id = %hospital_id,
            staff_id = %staff_id,
        );
        let _enter = span.enter();

        let (patient, hospital, staff) = (
            patient_id.as_str().to_string(),
            hospital_id.as_str().to_string(),
            staff_id.as_str().to_string(),
        );
        self.executor
            .run(|conn| {
                let found = diesel::select(diesel::dsl::exists(
                    access_grants::table
                        .filter(access_grants::patient_id.eq(&patient))
                        .filter(access_grants::hospital_id.eq(&hospital))
                        .filter(access_grants::staff_id.eq(&staff)),
                ))
                .get_result::<bool>(conn)?;
                Ok(found)
            })
            .map_err(|e| GrantLedgerError::Storage(e.to_string()))
    }

    async fn list_for_patient(
        &self,
        patient_id: &PatientId,
    ) -> Result<Vec<AccessGrant>, GrantLedgerError> {
        let patient = patient_id.as_str().to_string();
        self.executor
            .run(|conn| {
                let rows = access_grants::table
                    .filter(access_grants::patient_id.eq(&patient))
                    .order(access_grants::created_at_ms.desc())
                    .select(AccessGrantRow::as_select())
                    .load::<AccessGrantRow>(conn)?;

                let mut grants = Vec::with_capacity(rows.len());
                for row in rows {
                    let grant_id = row.id.clone();
                    let grant = self.mapper.to_domain(&row).map_err(|e| {
                        anyhow::anyhow!("Failed to map access_grant {}: {}", grant_id, e)
                    })?;
                    grants.push(grant);
                }
                Ok(grants)
            })
            .map_err(|e| GrantLedgerError::Storage(e.to_string()))
    }

    async fn find_by_challenge(
        &self,
        challenge_id: &ChallengeId,
    ) -> Result<Option<AccessGrant>, GrantLedgerError> {
        let challenge = challenge_id.as_str().to_string();
        self.executor
            .run(|conn| {
                let row = access_grants::table
                    .filter(access_grants::challenge_id.eq(&challenge))
                    .select(AccessGrantRow::as_select())
                    .first::<AccessGrantRow>(conn)
                    .optional()?;

                match row {
                    Some(r) => Ok(Some(self.mapper.to_domain(&r)?)),
                    None => Ok(None),
                }
            })
            .map_err(|e| GrantLedgerError::Storage(e.to_string()))
    }
}
