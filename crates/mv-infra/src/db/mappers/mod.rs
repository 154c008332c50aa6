pub mod access_grant_mapper;
pub mod challenge_mapper;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};

pub(crate) fn millis_to_utc(ms: i64, field: &str) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| anyhow!("invalid {} timestamp: {}", field, ms))
}
