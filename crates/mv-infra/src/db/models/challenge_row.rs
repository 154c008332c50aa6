use crate::db::schema::challenges;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = challenges)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChallengeRow {
    pub id: String,
    pub code: String,
    pub patient_id: String,
    pub hospital_id: String,
    pub staff_id: String,
    pub created_at_ms: i64,
    pub expires_at_ms: i64,
    pub consumed: bool,
    pub consumed_at_ms: Option<i64>,
    pub consumed_reason: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = challenges)]
pub struct NewChallengeRow {
    pub id: String,
    pub code: String,
    pub patient_id: String,
    pub hospital_id: String,
    pub staff_id: String,
    pub created_at_ms: i64,
    pub expires_at_ms: i64,
    pub consumed: bool,
}
