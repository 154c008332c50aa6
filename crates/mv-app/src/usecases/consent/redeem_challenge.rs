use std::sync::Arc;

use tracing::info;

use mv_core::consent::{AccessGrant, ConsentError, OtpCode};
use mv_core::ids::GrantId;
use mv_core::ports::{ChallengeRepositoryPort, ClockPort, RedemptionOutcome};

use crate::usecases::retry::{retry_storage, RetryPolicy};

/// Exchanges a one-time code for an access grant.
///
/// Single use is enforced by the challenge store: of any number of concurrent
/// redemptions of the same code, exactly one receives the grant and the others
/// see [`ConsentError::NotFound`].
pub struct RedeemChallenge {
    challenges: Arc<dyn ChallengeRepositoryPort>,
    clock: Arc<dyn ClockPort>,
    retry: RetryPolicy,
}

impl RedeemChallenge {
    pub fn new(challenges: Arc<dyn ChallengeRepositoryPort>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            challenges,
            clock,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Redeems `code`.
    ///
    /// # Errors
    /// - `Validation` when the code is blank
    /// - `NotFound` when no pending challenge holds the code (unknown or already used)
    /// - `Expired` when the challenge outlived its TTL; it is retired in the same step
    /// - `Storage` when the store failed; nothing was consumed
    #[tracing::instrument(name = "usecase.redeem_challenge.execute", skip(self, code))]
    pub async fn execute(&self, code: &str) -> Result<AccessGrant, ConsentError> {
        let code = OtpCode::parse(code)?;
        let outcome =
            retry_storage(&self.retry, "redeem_challenge", || self.try_redeem(&code)).await?;

        match outcome {
            RedemptionOutcome::Granted(grant) => {
                info!(
                    grant_id = %grant.id,
                    challenge_id = %grant.challenge_id,
                    patient_id = %grant.patient_id,
                    hospital_id = %grant.hospital_id,
                    staff_id = %grant.staff_id,
                    "Challenge redeemed, access granted"
                );
                Ok(grant)
            }
            RedemptionOutcome::Expired(challenge_id) => {
                info!(challenge_id = %challenge_id, "Redemption rejected: challenge expired");
                Err(ConsentError::Expired)
            }
            RedemptionOutcome::NotFound => {
                info!("Redemption rejected: no pending challenge for code");
                Err(ConsentError::NotFound)
            }
        }
    }

    async fn try_redeem(&self, code: &OtpCode) -> Result<RedemptionOutcome, ConsentError> {
        // Fresh grant id per attempt; a failed attempt committed nothing.
        let grant_id = GrantId::new();
        Ok(self
            .challenges
            .redeem(code, &grant_id, self.clock.now())
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::consent::test_support::{t0, FixedClock, InMemoryConsentStore};
    use chrono::TimeDelta;
    use mv_core::consent::{Challenge, ChallengeRequest, ConsumedReason};
    use mv_core::ids::ChallengeId;
    use std::sync::atomic::Ordering;

    async fn seed(store: &InMemoryConsentStore, code: &str) -> Challenge {
        let challenge = Challenge::issue(
            ChallengeId::from("c1"),
            OtpCode::from_stored(code.to_string()),
            &ChallengeRequest::new("p1", "h1", "s1"),
            t0(),
            TimeDelta::minutes(10),
        );
        store.insert_pending(&challenge).await.unwrap();
        challenge
    }

    #[tokio::test]
    async fn test_redeem_creates_grant_for_challenge_tuple() {
        let store = InMemoryConsentStore::new();
        let clock = FixedClock::at(t0());
        seed(&store, "042917").await;
        clock.advance(TimeDelta::minutes(3));
        let uc = RedeemChallenge::new(store.clone(), clock);

        let grant = uc.execute(" 042917 ").await.unwrap();

        assert_eq!(grant.challenge_id, ChallengeId::from("c1"));
        assert_eq!(grant.patient_id.as_str(), "p1");
        assert_eq!(grant.hospital_id.as_str(), "h1");
        assert_eq!(grant.staff_id.as_str(), "s1");
        assert_eq!(grant.created_at, t0() + TimeDelta::minutes(3));

        let challenges = store.challenges().await;
        assert!(challenges[0].consumed);
        assert_eq!(challenges[0].consumed_reason, Some(ConsumedReason::Redeemed));
    }

    #[tokio::test]
    async fn test_second_redemption_is_not_found() {
        let store = InMemoryConsentStore::new();
        seed(&store, "042917").await;
        let uc = RedeemChallenge::new(store.clone(), FixedClock::at(t0()));

        uc.execute("042917").await.unwrap();
        let err = uc.execute("042917").await.unwrap_err();

        assert_eq!(err, ConsentError::NotFound);
        assert_eq!(err.to_string(), "invalid code");
    }

    #[tokio::test]
    async fn test_unknown_code_is_not_found() {
        let store = InMemoryConsentStore::new();
        seed(&store, "042917").await;
        let uc = RedeemChallenge::new(store, FixedClock::at(t0()));

        assert_eq!(uc.execute("999999").await, Err(ConsentError::NotFound));
        assert_eq!(uc.execute("abc").await, Err(ConsentError::NotFound));
    }

    #[tokio::test]
    async fn test_blank_code_is_validation_error() {
        let store = InMemoryConsentStore::new();
        let uc = RedeemChallenge::new(store.clone(), FixedClock::at(t0()));

        let err = uc.execute("   ").await.unwrap_err();

        assert_eq!(err, ConsentError::Validation("code required".into()));
        assert_eq!(store.redeem_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expired_code_is_retired() {
        let store = InMemoryConsentStore::new();
        let clock = FixedClock::at(t0());
        seed(&store, "042917").await;
        clock.advance(TimeDelta::minutes(11));
        let uc = RedeemChallenge::new(store.clone(), clock);

        assert_eq!(uc.execute("042917").await, Err(ConsentError::Expired));
        assert_eq!(uc.execute("042917").await, Err(ConsentError::NotFound));

        let challenges = store.challenges().await;
        assert_eq!(challenges[0].consumed_reason, Some(ConsumedReason::Expired));
    }

    #[tokio::test]
    async fn test_reissued_code_redeems_the_fresh_challenge() {
        let store = InMemoryConsentStore::new();
        let clock = FixedClock::at(t0());
        seed(&store, "042917").await;
        clock.advance(TimeDelta::minutes(11));
        let reissued = Challenge::issue(
            ChallengeId::from("c2"),
            OtpCode::from_stored("042917".to_string()),
            &ChallengeRequest::new("p1", "h1", "s2"),
            clock.now(),
            TimeDelta::minutes(10),
        );
        store.insert_pending(&reissued).await.unwrap();
        let uc = RedeemChallenge::new(store.clone(), clock);

        let grant = uc.execute("042917").await.unwrap();

        assert_eq!(grant.challenge_id, ChallengeId::from("c2"));
        assert_eq!(grant.staff_id.as_str(), "s2");
        let old = store
            .find_by_id(&ChallengeId::from("c1"))
            .await
            .unwrap()
            .unwrap();
        assert!(old.consumed);
        assert_eq!(old.consumed_reason, Some(ConsumedReason::Expired));
    }

    #[tokio::test]
    async fn test_expiry_boundary_is_still_redeemable() {
        let store = InMemoryConsentStore::new();
        let clock = FixedClock::at(t0());
        seed(&store, "042917").await;
        clock.advance(TimeDelta::minutes(10));
        let uc = RedeemChallenge::new(store, clock);

        assert!(uc.execute("042917").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_storage_failure_is_retried() {
        let store = InMemoryConsentStore::new();
        seed(&store, "042917").await;
        store.fail_next(2);
        let uc = RedeemChallenge::new(store.clone(), FixedClock::at(t0()));

        assert!(uc.execute("042917").await.is_ok());
        assert_eq!(store.redeem_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_when_retries_disabled() {
        let store = InMemoryConsentStore::new();
        seed(&store, "042917").await;
        store.fail_next(1);
        let uc = RedeemChallenge::new(store.clone(), FixedClock::at(t0()))
            .with_retry(RetryPolicy::none());

        let err = uc.execute("042917").await.unwrap_err();
        assert!(err.is_retryable());
        assert!(!store.challenges().await[0].consumed);
    }
}
