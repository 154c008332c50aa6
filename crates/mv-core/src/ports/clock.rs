use chrono::{DateTime, Utc};
use tracing::warn;

pub trait ClockPort: Send + Sync {
    fn now_ms(&self) -> i64;

    /// Out-of-range readings fall back to the epoch, which makes every
    /// challenge issued from them already expired.
    fn now(&self) -> DateTime<Utc> {
        let now_ms = self.now_ms();
        DateTime::from_timestamp_millis(now_ms).unwrap_or_else(|| {
            warn!(now_ms, "Clock reading out of range; using the epoch");
            DateTime::<Utc>::default()
        })
    }
}
