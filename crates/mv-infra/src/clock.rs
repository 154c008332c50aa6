use chrono::{DateTime, Utc};
use mv_core::ports::ClockPort;

/// Wall clock used for issuance and expiry checks.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
