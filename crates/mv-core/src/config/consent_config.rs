use std::time::Duration;

use chrono::TimeDelta;
use thiserror::Error;

use crate::consent::otp::{DEFAULT_CODE_LENGTH, MAX_CODE_LENGTH, MIN_CODE_LENGTH};

/// Longest accepted challenge lifetime.
const MAX_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("code_length must be between {min} and {max}, got {actual}")]
    CodeLength { min: usize, max: usize, actual: usize },

    #[error("ttl must be greater than zero and at most 24 hours")]
    Ttl,

    #[error("{0} must be at least 1")]
    Attempts(&'static str),
}

/// Consent exchange settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentConfig {
    /// Digits per one-time code.
    pub code_length: usize,

    /// Window after issuance during which a challenge can be redeemed.
    pub ttl: Duration,

    /// Code generations tried when a freshly generated code collides with a
    /// pending one.
    pub max_code_attempts: u32,

    /// Attempts for a whole operation that failed with a storage error.
    pub storage_retry_attempts: u32,

    /// Base delay between storage retries; grows linearly with the attempt.
    pub storage_retry_backoff: Duration,
}

impl ConsentConfig {
    pub fn defaults() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            ttl: Duration::from_secs(10 * 60),
            max_code_attempts: 5,
            storage_retry_attempts: 3,
            storage_retry_backoff: Duration::from_millis(50),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&self.code_length) {
            return Err(ConfigError::CodeLength {
                min: MIN_CODE_LENGTH,
                max: MAX_CODE_LENGTH,
                actual: self.code_length,
            });
        }
        if self.ttl.is_zero() || self.ttl > MAX_TTL {
            return Err(ConfigError::Ttl);
        }
        if self.max_code_attempts == 0 {
            return Err(ConfigError::Attempts("max_code_attempts"));
        }
        if self.storage_retry_attempts == 0 {
            return Err(ConfigError::Attempts("storage_retry_attempts"));
        }
        Ok(())
    }

    pub fn ttl_delta(&self) -> TimeDelta {
        TimeDelta::milliseconds(self.ttl.as_millis().min(i64::MAX as u128) as i64)
    }
}

impl Default for ConsentConfig {
    fn default() -> Self {
        Self::defaults()
    }
}
