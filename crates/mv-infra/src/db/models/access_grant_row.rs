use crate::db::schema::access_grants;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = access_grants)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccessGrantRow {
    pub id: String,
    pub challenge_id: String,
    pub patient_id: String,
    pub hospital_id: String,
    pub staff_id: String,
    pub created_at_ms: i64,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = access_grants)]
pub struct NewAccessGrantRow {
    pub id: String,
    pub challenge_id: String,
    pub patient_id: String,
    pub hospital_id: String,
    pub staff_id: String,
    pub created_at_ms: i64,
}

impl NewAccessGrantRow {
    /// The grant produced by redeeming `challenge`, carrying its tuple.
    pub fn for_challenge(
        challenge: &super::ChallengeRow,
        grant_id: String,
        now_ms: i64,
    ) -> Self {
        Self {
            id: grant_id,
            challenge_id: challenge.id.clone(),
            patient_id: challenge.patient_id.clone(),
            hospital_id: challenge.hospital_id.clone(),
            staff_id: challenge.staff_id.clone(),
            created_at_ms: now_ms,
        }
    }
}
