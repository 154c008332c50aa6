//! # Dependency Injection
//!
//! The only place that depends on `mv-infra` and `mv-app` together. It builds
//! the SQLite store, wraps it in the port traits and hands those to the use
//! cases. No consent decisions are made here.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mv_app::{
    CheckAccess, IssueChallenge, ListPatientGrants, ListPendingChallenges, RecordAccessPolicy,
    RedeemChallenge, RetryPolicy,
};
use mv_core::config::ConfigError;
use mv_core::consent::otp::InvalidCodeLength;
use mv_core::ports::{ChallengeRepositoryPort, ClockPort, GrantLedgerPort};
use mv_core::OtpGenerator;
use mv_infra::db::mappers::access_grant_mapper::AccessGrantRowMapper;
use mv_infra::db::mappers::challenge_mapper::ChallengeRowMapper;
use mv_infra::db::pool::{init_db_pool_with, DbPool, PoolOptions};
use mv_infra::db::repositories::{DieselChallengeRepository, DieselGrantLedger};
use mv_infra::db::DieselSqliteExecutor;
use mv_infra::SystemClock;
use tracing::info;

use super::config::AppConfig;

/// Result type for wiring operations
pub type WiringResult<T> = Result<T, WiringError>;

/// Errors during dependency injection
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    #[error("Invalid consent configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid code generator settings: {0}")]
    Generator(#[from] InvalidCodeLength),

    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),
}

/// Every consent use case, wired against one store.
pub struct ConsentRuntime {
    pub issue_challenge: IssueChallenge,
    pub redeem_challenge: RedeemChallenge,
    pub check_access: CheckAccess,
    pub list_pending: ListPendingChallenges,
    pub list_grants: ListPatientGrants,
    pub record_access: RecordAccessPolicy,
}

/// Create SQLite database connection pool, creating the parent directory and
/// running migrations.
fn create_db_pool(config: &AppConfig) -> WiringResult<DbPool> {
    let db_path: &Path = &config.database_path;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            WiringError::DatabaseInit(format!("Failed to create DB directory: {}", e))
        })?;
    }

    let db_url = db_path
        .to_str()
        .ok_or_else(|| WiringError::DatabaseInit("Invalid database path".to_string()))?;

    let options = PoolOptions {
        max_size: config.pool_size.max(1),
        busy_timeout: Duration::from_millis(config.busy_timeout_ms),
        ..PoolOptions::default()
    };

    init_db_pool_with(db_url, options)
        .map_err(|e| WiringError::DatabaseInit(format!("Failed to initialize DB: {:#}", e)))
}

/// Wire the runtime with the system clock.
pub fn wire_consent_runtime(config: &AppConfig) -> WiringResult<ConsentRuntime> {
    wire_consent_runtime_with_clock(config, Arc::new(SystemClock))
}

pub fn wire_consent_runtime_with_clock(
    config: &AppConfig,
    clock: Arc<dyn ClockPort>,
) -> WiringResult<ConsentRuntime> {
    config.consent.validate()?;
    let generator = OtpGenerator::new(config.consent.code_length)?;

    let pool = create_db_pool(config)?;
    let executor = DieselSqliteExecutor::new(pool);

    // Mappers are zero-sized
    let challenges: Arc<dyn ChallengeRepositoryPort> = Arc::new(DieselChallengeRepository::new(
        executor.clone(),
        ChallengeRowMapper,
        AccessGrantRowMapper,
    ));
    let grants: Arc<dyn GrantLedgerPort> =
        Arc::new(DieselGrantLedger::new(executor, AccessGrantRowMapper));

    let retry = RetryPolicy::from_config(&config.consent);

    info!(
        database = %config.database_path.display(),
        code_length = config.consent.code_length,
        ttl_secs = config.consent.ttl.as_secs(),
        "Consent runtime wired"
    );

    Ok(ConsentRuntime {
        issue_challenge: IssueChallenge::new(
            challenges.clone(),
            clock.clone(),
            generator,
            &config.consent,
        ),
        redeem_challenge: RedeemChallenge::new(challenges.clone(), clock.clone())
            .with_retry(retry),
        check_access: CheckAccess::new(grants.clone()),
        list_pending: ListPendingChallenges::new(challenges, clock),
        list_grants: ListPatientGrants::new(grants.clone()),
        record_access: RecordAccessPolicy::new(grants),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> AppConfig {
        AppConfig {
            database_path: dir.path().join("nested").join("medivault.db"),
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_wiring_error_display() {
        let err = WiringError::DatabaseInit("disk full".to_string());
        assert_eq!(err.to_string(), "Database initialization failed: disk full");
    }

    #[test]
    fn test_wiring_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        assert!(wire_consent_runtime(&config).is_ok());
        assert!(dir.path().join("nested").join("medivault.db").exists());
    }

    #[test]
    fn test_invalid_consent_config_is_rejected_before_opening_db() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.consent.code_length = 2;

        let err = wire_consent_runtime(&config).err().unwrap();

        assert!(matches!(err, WiringError::Config(_)));
        assert!(!dir.path().join("nested").exists());
    }
}
