use std::sync::Arc;

use chrono::TimeDelta;
use tracing::{debug, info, warn};

use mv_core::config::ConsentConfig;
use mv_core::consent::otp::CodeOrigin;
use mv_core::consent::{Challenge, ChallengeRequest, ConsentError, OtpGenerator};
use mv_core::ids::ChallengeId;
use mv_core::ports::{ChallengeRepositoryPort, ChallengeStoreError, ClockPort};

use crate::usecases::retry::{retry_storage, RetryPolicy};

/// Creates a pending challenge for a hospital's request to view a patient's
/// records.
///
/// The returned challenge carries the code that the patient must receive
/// through a trusted channel; it is never logged here.
pub struct IssueChallenge {
    challenges: Arc<dyn ChallengeRepositoryPort>,
    clock: Arc<dyn ClockPort>,
    generator: OtpGenerator,
    ttl: TimeDelta,
    max_code_attempts: u32,
    retry: RetryPolicy,
}

impl IssueChallenge {
    pub fn new(
        challenges: Arc<dyn ChallengeRepositoryPort>,
        clock: Arc<dyn ClockPort>,
        generator: OtpGenerator,
        config: &ConsentConfig,
    ) -> Self {
        Self {
            challenges,
            clock,
            generator,
            ttl: config.ttl_delta(),
            max_code_attempts: config.max_code_attempts.max(1),
            retry: RetryPolicy::from_config(config),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Validates the request and stores a new pending challenge.
    ///
    /// A generated code that collides with another pending challenge is
    /// regenerated up to `max_code_attempts` times. Storage failures retry the
    /// whole issuance; a failed attempt never leaves a challenge behind.
    #[tracing::instrument(
        name = "usecase.issue_challenge.execute",
        skip(self, request),
        fields(
            patient_id = %request.patient_id,
            hospital_id = %request.hospital_id,
            staff_id = %request.staff_id,
        )
    )]
    pub async fn execute(&self, request: ChallengeRequest) -> Result<Challenge, ConsentError> {
        let request = request.validate()?;
        retry_storage(&self.retry, "issue_challenge", || self.try_issue(&request)).await
    }

    async fn try_issue(&self, request: &ChallengeRequest) -> Result<Challenge, ConsentError> {
        for attempt in 1..=self.max_code_attempts {
            let generated = self.generator.generate();
            let challenge = Challenge::issue(
                ChallengeId::new(),
                generated.code,
                request,
                self.clock.now(),
                self.ttl,
            );

            match self.challenges.insert_pending(&challenge).await {
                Ok(()) => {
                    if generated.origin == CodeOrigin::Fallback {
                        warn!(
                            challenge_id = %challenge.id,
                            "Challenge issued with a fallback code"
                        );
                    }
                    info!(
                        challenge_id = %challenge.id,
                        expires_at = %challenge.expires_at,
                        "Issued consent challenge"
                    );
                    return Ok(challenge);
                }
                Err(ChallengeStoreError::CodeConflict) => {
                    debug!(attempt, "Generated code is already pending, regenerating");
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(
            attempts = self.max_code_attempts,
            "Could not find a free code for the challenge"
        );
        Err(ConsentError::Storage(format!(
            "no unique code after {} attempts",
            self.max_code_attempts
        )))
    }
}
