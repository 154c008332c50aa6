//! # Configuration Loader
//!
//! Reads the TOML configuration file into [`AppConfig`]. Missing keys take
//! their defaults; values are not validated here. Validation of the consent
//! settings happens when the runtime is wired.
//!
//! ```toml
//! [storage]
//! database_path = "/var/lib/medivault/medivault.db"
//! busy_timeout_ms = 5000
//! pool_size = 8
//!
//! [consent]
//! code_length = 6
//! ttl_secs = 600
//! max_code_attempts = 5
//! storage_retry_attempts = 3
//! storage_retry_backoff_ms = 50
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use mv_core::ConsentConfig;

pub const DEFAULT_DATABASE_PATH: &str = "medivault.db";
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_POOL_SIZE: u32 = 8;

/// Application configuration DTO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub busy_timeout_ms: u64,
    pub pool_size: u32,
    pub consent: ConsentConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            pool_size: DEFAULT_POOL_SIZE,
            consent: ConsentConfig::defaults(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(toml_value: &toml::Value) -> Self {
        let defaults = Self::default();
        let consent_defaults = defaults.consent.clone();

        Self {
            database_path: toml_value
                .get("storage")
                .and_then(|s| s.get("database_path"))
                .and_then(|v| v.as_str())
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            busy_timeout_ms: unsigned(toml_value, "storage", "busy_timeout_ms")
                .unwrap_or(defaults.busy_timeout_ms),
            pool_size: unsigned(toml_value, "storage", "pool_size")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.pool_size),
            consent: ConsentConfig {
                code_length: unsigned(toml_value, "consent", "code_length")
                    .and_then(|v| usize::try_from(v).ok())
                    .unwrap_or(consent_defaults.code_length),
                ttl: unsigned(toml_value, "consent", "ttl_secs")
                    .map(Duration::from_secs)
                    .unwrap_or(consent_defaults.ttl),
                max_code_attempts: unsigned(toml_value, "consent", "max_code_attempts")
                    .and_then(|v| u32::try_from(v).ok())
                    .unwrap_or(consent_defaults.max_code_attempts),
                storage_retry_attempts: unsigned(toml_value, "consent", "storage_retry_attempts")
                    .and_then(|v| u32::try_from(v).ok())
                    .unwrap_or(consent_defaults.storage_retry_attempts),
                storage_retry_backoff: unsigned(
                    toml_value,
                    "consent",
                    "storage_retry_backoff_ms",
                )
                .map(Duration::from_millis)
                .unwrap_or(consent_defaults.storage_retry_backoff),
            },
        }
    }
}

/// Non-negative integer at `[section] key`.
fn unsigned(toml_value: &toml::Value, section: &str, key: &str) -> Option<u64> {
    toml_value
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_integer())
        .and_then(|v| u64::try_from(v).ok())
}

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns error if the file cannot be read or is not valid TOML.
pub fn load_config(config_path: &Path) -> anyhow::Result<AppConfig> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    Ok(AppConfig::from_toml(&toml_value))
}
