//! One-time code generation.
//!
//! Codes are fixed-length decimal strings, left-padded with zeros, drawn
//! uniformly from `[0, 10^length)`. The OS CSPRNG is the normal source; a seeded
//! pseudo-random generator is used only when it is unavailable, and the result
//! says so through [`CodeOrigin::Fallback`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::{OsRng, StdRng};
use rand::{Rng, SeedableRng, TryRngCore};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::ConsentError;

pub const DEFAULT_CODE_LENGTH: usize = 6;
pub const MIN_CODE_LENGTH: usize = 4;
pub const MAX_CODE_LENGTH: usize = 12;

/// A one-time code. This is the secret of the exchange: `Debug` is redacted
/// and there is no `Display`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    /// Parses a caller-submitted code.
    ///
    /// Only surrounding whitespace is stripped. The format is not checked: a
    /// malformed code simply matches no pending challenge.
    pub fn parse(input: &str) -> Result<Self, ConsentError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ConsentError::missing("code"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Wraps a code read back from storage.
    pub fn from_stored(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

/// A source of uniformly distributed 64-bit words.
pub trait EntropySource: Send + Sync {
    /// `None` when the source cannot produce randomness right now.
    fn next_u64(&self) -> Option<u64>;
}

/// Operating-system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn next_u64(&self) -> Option<u64> {
        OsRng.try_next_u64().ok()
    }
}

/// A source that is never available. Forces the fallback path.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableEntropy;

impl EntropySource for UnavailableEntropy {
    fn next_u64(&self) -> Option<u64> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeOrigin {
    Secure,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub code: OtpCode,
    pub origin: CodeOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("code length must be between 4 and 12 digits, got {0}")]
pub struct InvalidCodeLength(pub usize);

#[derive(Clone)]
pub struct OtpGenerator {
    length: usize,
    bound: u64,
    entropy: Arc<dyn EntropySource>,
}

impl OtpGenerator {
    pub fn new(length: usize) -> Result<Self, InvalidCodeLength> {
        Self::with_entropy(length, Arc::new(OsEntropy))
    }

    pub fn with_entropy(
        length: usize,
        entropy: Arc<dyn EntropySource>,
    ) -> Result<Self, InvalidCodeLength> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&length) {
            return Err(InvalidCodeLength(length));
        }
        Ok(Self {
            length,
            bound: 10u64.pow(length as u32),
            entropy,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn generate(&self) -> GeneratedCode {
        let (value, origin) = match self.secure_value() {
            Some(value) => (value, CodeOrigin::Secure),
            None => {
                warn!(
                    length = self.length,
                    "Secure random source unavailable; using pseudo-random fallback"
                );
                (fallback_value(self.bound), CodeOrigin::Fallback)
            }
        };

        GeneratedCode {
            code: OtpCode(format!("{:0width$}", value, width = self.length)),
            origin,
        }
    }

    /// Rejection sampling: only words below the largest multiple of `bound`
    /// are accepted, so the modulo is unbiased.
    fn secure_value(&self) -> Option<u64> {
        let zone = u64::MAX - (u64::MAX % self.bound);
        loop {
            let word = self.entropy.next_u64()?;
            if word < zone {
                return Some(word % self.bound);
            }
        }
    }
}

impl fmt::Debug for OtpGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpGenerator")
            .field("length", &self.length)
            .finish_non_exhaustive()
    }
}

/// Generates one code of `length` digits from the OS CSPRNG.
pub fn generate_code(length: usize) -> Result<GeneratedCode, InvalidCodeLength> {
    Ok(OtpGenerator::new(length)?.generate())
}

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

fn fallback_value(bound: u64) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let counter = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let seed = nanos
        ^ (u64::from(std::process::id()) << 32)
        ^ counter.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    StdRng::seed_from_u64(seed).random_range(0..bound)
}
