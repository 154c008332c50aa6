//! Challenge Store
//!
//! Implements [`ChallengeRepositoryPort`] on SQLite. Issuance and redemption
//! both run inside `BEGIN IMMEDIATE` transactions, which take the database
//! write lock up front. Concurrent redeemers of one code, in this process or
//! another, are therefore serialized by SQLite itself; the loser re-reads the
//! row after the winner committed and finds it consumed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::{debug, debug_span};

use mv_core::consent::{AccessGrant, Challenge, ConsumedReason, OtpCode};
use mv_core::ids::{ChallengeId, GrantId, PatientId};
use mv_core::ports::{ChallengeRepositoryPort, ChallengeStoreError, RedemptionOutcome};

use crate::db::models::{AccessGrantRow, ChallengeRow, NewAccessGrantRow, NewChallengeRow};
use crate::db::ports::{DbExecutor, InsertMapper, RowMapper};
use crate::db::schema::{access_grants, challenges};

pub struct DieselChallengeRepository<E, MC, MG> {
    executor: E,
    challenge_mapper: MC,
    grant_mapper: MG,
}

impl<E, MC, MG> DieselChallengeRepository<E, MC, MG> {
    pub fn new(executor: E, challenge_mapper: MC, grant_mapper: MG) -> Self {
        Self {
            executor,
            challenge_mapper,
            grant_mapper,
        }
    }
}

enum RedeemStep {
    Granted(AccessGrant),
    Expired(String),
    Missing,
}

/// Error type of the redemption transaction. Any variant rolls it back.
#[derive(Debug)]
enum RedeemTxError {
    Diesel(DieselError),
    Mapping(anyhow::Error),
}

impl From<DieselError> for RedeemTxError {
    fn from(e: DieselError) -> Self {
        RedeemTxError::Diesel(e)
    }
}

impl std::fmt::Display for RedeemTxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RedeemTxError::Diesel(e) => write!(f, "{e}"),
            RedeemTxError::Mapping(e) => write!(f, "failed to map access grant: {e}"),
        }
    }
}

fn storage(e: impl std::fmt::Display) -> ChallengeStoreError {
    ChallengeStoreError::Storage(e.to_string())
}

#[async_trait]
impl<E, MC, MG> ChallengeRepositoryPort for DieselChallengeRepository<E, MC, MG>
where
    E: DbExecutor,
    MC: InsertMapper<Challenge, NewChallengeRow> + RowMapper<ChallengeRow, Challenge>,
    MG: RowMapper<AccessGrantRow, AccessGrant>,
{
    /// Inserts a pending challenge.
    ///
    /// Inside one immediate transaction, any expired-but-pending challenge
    /// holding the same code is first retired as expired, then the new row is
    /// inserted. A remaining holder of the code trips the partial unique index
    /// and surfaces as [`ChallengeStoreError::CodeConflict`].
    async fn insert_pending(&self, challenge: &Challenge) -> Result<(), ChallengeStoreError> {
        let span = debug_span!(
            "infra.sqlite.insert_challenge",
            table = "challenges",
            challenge_id = %challenge.id,
        );
        let _enter = span.enter();

        let row: NewChallengeRow = self.challenge_mapper.to_row(challenge).map_err(storage)?;
        let now_ms = row.created_at_ms;

        let result = self
            .executor
            .run(|conn| {
                Ok(conn.immediate_transaction::<_, DieselError, _>(|conn| {
                    let retired = diesel::update(
                        challenges::table
                            .filter(challenges::code.eq(&row.code))
                            .filter(challenges::consumed.eq(false))
                            .filter(challenges::expires_at_ms.lt(now_ms)),
                    )
                    .set((
                        challenges::consumed.eq(true),
                        challenges::consumed_at_ms.eq(Some(now_ms)),
                        challenges::consumed_reason
                            .eq(Some(ConsumedReason::Expired.as_str().to_string())),
                    ))
                    .execute(conn)?;

                    diesel::insert_into(challenges::table)
                        .values(&row)
                        .execute(conn)?;

                    Ok(retired)
                }))
            })
            .map_err(storage)?;

        match result {
            Ok(retired) => {
                if retired > 0 {
                    debug!(retired, "Retired expired challenge holding the same code");
                }
                Ok(())
            }
            Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                Err(ChallengeStoreError::CodeConflict)
            }
            Err(e) => Err(storage(e)),
        }
    }

    /// Redeems `code` as one immediate transaction:
    ///
    /// 1. Find the pending challenge holding the code.
    /// 2. Conditionally mark it consumed (`WHERE id = ? AND consumed = 0`); the
    ///    update must affect exactly one row.
    /// 3. If it had expired, commit the expiry mark and stop.
    /// 4. Otherwise insert the grant carrying the challenge's tuple.
    ///
    /// Any failure rolls back every step, so the challenge stays pending.
    async fn redeem(
        &self,
        code: &OtpCode,
        grant_id: &GrantId,
        now: DateTime<Utc>,
    ) -> Result<RedemptionOutcome, ChallengeStoreError> {
        let span = debug_span!(
            "infra.sqlite.redeem_challenge",
            table = "challenges",
            grant_id = %grant_id,
        );
        let _enter = span.enter();

        let code_value = code.as_str().to_string();
        let grant_id_value = grant_id.as_str().to_string();
        let now_ms = now.timestamp_millis();

        let step = self
            .executor
            .run(|conn| {
                Ok(conn.immediate_transaction::<_, RedeemTxError, _>(|conn| {
                    let pending = challenges::table
                        .filter(challenges::code.eq(&code_value))
                        .filter(challenges::consumed.eq(false))
                        .select(ChallengeRow::as_select())
                        .first::<ChallengeRow>(conn)
                        .optional()?;

                    let Some(challenge) = pending else {
                        return Ok(RedeemStep::Missing);
                    };

                    let reason = if now_ms > challenge.expires_at_ms {
                        ConsumedReason::Expired
                    } else {
                        ConsumedReason::Redeemed
                    };

                    let claimed = diesel::update(
                        challenges::table
                            .filter(challenges::id.eq(&challenge.id))
                            .filter(challenges::consumed.eq(false)),
                    )
                    .set((
                        challenges::consumed.eq(true),
                        challenges::consumed_at_ms.eq(Some(now_ms)),
                        challenges::consumed_reason.eq(Some(reason.as_str().to_string())),
                    ))
                    .execute(conn)?;

                    if claimed != 1 {
                        return Ok(RedeemStep::Missing);
                    }

                    if reason == ConsumedReason::Expired {
                        return Ok(RedeemStep::Expired(challenge.id));
                    }

                    let new_grant = NewAccessGrantRow::for_challenge(
                        &challenge,
                        grant_id_value.clone(),
                        now_ms,
                    );
                    let grant_row = diesel::insert_into(access_grants::table)
                        .values(&new_grant)
                        .returning(AccessGrantRow::as_returning())
                        .get_result::<AccessGrantRow>(conn)?;

                    let grant = self
                        .grant_mapper
                        .to_domain(&grant_row)
                        .map_err(RedeemTxError::Mapping)?;

                    Ok(RedeemStep::Granted(grant))
                }))
            })
            .map_err(storage)?
            .map_err(storage)?;

        match step {
            RedeemStep::Granted(grant) => {
                debug!(challenge_id = %grant.challenge_id, "Challenge consumed; grant recorded");
                Ok(RedemptionOutcome::Granted(grant))
            }
            RedeemStep::Expired(id) => {
                debug!(challenge_id = %id, "Challenge expired; retired");
                Ok(RedemptionOutcome::Expired(ChallengeId::from(id)))
            }
            RedeemStep::Missing => Ok(RedemptionOutcome::NotFound),
        }
    }

    async fn find_by_id(
        &self,
        id: &ChallengeId,
    ) -> Result<Option<Challenge>, ChallengeStoreError> {
        let id_value = id.as_str().to_string();
        self.executor
            .run(|conn| {
                let row = challenges::table
                    .filter(challenges::id.eq(&id_value))
                    .select(ChallengeRow::as_select())
                    .first::<ChallengeRow>(conn)
                    .optional()?;

                match row {
                    Some(r) => Ok(Some(self.challenge_mapper.to_domain(&r)?)),
                    None => Ok(None),
                }
            })
            .map_err(storage)
    }

    async fn list_pending_for_patient(
        &self,
        patient_id: &PatientId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Challenge>, ChallengeStoreError> {
        let span = debug_span!(
            "infra.sqlite.list_pending_challenges",
            table = "challenges",
            patient_id = %patient_id,
        );
        let _enter = span.enter();

        let patient_value = patient_id.as_str().to_string();
        let now_ms = now.timestamp_millis();
        self.executor
            .run(|conn| {
                let rows = challenges::table
                    .filter(challenges::patient_id.eq(&patient_value))
                    .filter(challenges::consumed.eq(false))
                    .filter(challenges::expires_at_ms.ge(now_ms))
                    .order(challenges::created_at_ms.desc())
                    .select(ChallengeRow::as_select())
                    .load::<ChallengeRow>(conn)?;

                rows.iter()
                    .map(|row| self.challenge_mapper.to_domain(row))
                    .collect::<anyhow::Result<Vec<_>>>()
            })
            .map_err(storage)
    }
}
