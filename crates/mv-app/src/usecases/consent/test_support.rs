//! In-memory ports shared by the consent use case tests.

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tokio::sync::Mutex;

use mv_core::consent::{AccessGrant, Challenge, ConsumedReason, OtpCode};
use mv_core::ids::{ChallengeId, GrantId, HospitalId, PatientId, StaffId};
use mv_core::ports::{
    ChallengeRepositoryPort, ChallengeStoreError, ClockPort, GrantLedgerError, GrantLedgerPort,
    RedemptionOutcome,
};

pub(crate) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 20, 10, 0, 0).unwrap()
}

pub(crate) struct FixedClock {
    now_ms: AtomicI64,
}

impl FixedClock {
    pub(crate) fn at(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            now_ms: AtomicI64::new(now.timestamp_millis()),
        })
    }

    pub(crate) fn advance(&self, delta: TimeDelta) {
        self.now_ms
            .fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
    }
}

impl ClockPort for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct State {
    challenges: Vec<Challenge>,
    grants: Vec<AccessGrant>,
}

/// Challenge store and grant ledger over one mutex, so redemption is atomic.
#[derive(Default)]
pub(crate) struct InMemoryConsentStore {
    state: Mutex<State>,
    forced_conflicts: AtomicU32,
    forced_failures: AtomicU32,
    pub(crate) insert_calls: AtomicUsize,
    pub(crate) redeem_calls: AtomicUsize,
}

impl InMemoryConsentStore {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The next `n` inserts report a code collision.
    pub(crate) fn conflict_next(&self, n: u32) {
        self.forced_conflicts.store(n, Ordering::SeqCst);
    }

    /// The next `n` calls of any kind fail with a storage error.
    pub(crate) fn fail_next(&self, n: u32) {
        self.forced_failures.store(n, Ordering::SeqCst);
    }

    pub(crate) async fn challenges(&self) -> Vec<Challenge> {
        self.state.lock().await.challenges.clone()
    }

    fn take(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn storage_failure(&self) -> Option<String> {
        Self::take(&self.forced_failures).then(|| "database is locked".to_string())
    }
}

#[async_trait]
impl ChallengeRepositoryPort for InMemoryConsentStore {
    async fn insert_pending(&self, challenge: &Challenge) -> Result<(), ChallengeStoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.storage_failure() {
            return Err(ChallengeStoreError::Storage(msg));
        }
        if Self::take(&self.forced_conflicts) {
            return Err(ChallengeStoreError::CodeConflict);
        }

        let mut state = self.state.lock().await;
        let now = challenge.created_at;
        for held in state
            .challenges
            .iter_mut()
            .filter(|c| c.code == challenge.code && !c.consumed && c.is_expired_at(now))
        {
            held.consumed = true;
            held.consumed_at = Some(now);
            held.consumed_reason = Some(ConsumedReason::Expired);
        }
        if state
            .challenges
            .iter()
            .any(|c| c.code == challenge.code && c.is_redeemable_at(now))
        {
            return Err(ChallengeStoreError::CodeConflict);
        }
        state.challenges.push(challenge.clone());
        Ok(())
    }

    async fn redeem(
        &self,
        code: &OtpCode,
        grant_id: &GrantId,
        now: DateTime<Utc>,
    ) -> Result<RedemptionOutcome, ChallengeStoreError> {
        self.redeem_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.storage_failure() {
            return Err(ChallengeStoreError::Storage(msg));
        }

        let mut state = self.state.lock().await;
        let Some(challenge) = state
            .challenges
            .iter_mut()
            .find(|c| &c.code == code && !c.consumed)
        else {
            return Ok(RedemptionOutcome::NotFound);
        };

        challenge.consumed = true;
        challenge.consumed_at = Some(now);
        if challenge.is_expired_at(now) {
            challenge.consumed_reason = Some(ConsumedReason::Expired);
            return Ok(RedemptionOutcome::Expired(challenge.id.clone()));
        }
        challenge.consumed_reason = Some(ConsumedReason::Redeemed);

        let grant = AccessGrant {
            id: grant_id.clone(),
            challenge_id: challenge.id.clone(),
            patient_id: challenge.patient_id.clone(),
            hospital_id: challenge.hospital_id.clone(),
            staff_id: challenge.staff_id.clone(),
            created_at: now,
        };
        state.grants.push(grant.clone());
        Ok(RedemptionOutcome::Granted(grant))
    }

    async fn find_by_id(
        &self,
        id: &ChallengeId,
    ) -> Result<Option<Challenge>, ChallengeStoreError> {
        let state = self.state.lock().await;
        Ok(state.challenges.iter().find(|c| &c.id == id).cloned())
    }

    async fn list_pending_for_patient(
        &self,
        patient_id: &PatientId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Challenge>, ChallengeStoreError> {
        if let Some(msg) = self.storage_failure() {
            return Err(ChallengeStoreError::Storage(msg));
        }
        let state = self.state.lock().await;
        let mut pending: Vec<Challenge> = state
            .challenges
            .iter()
            .filter(|c| &c.patient_id == patient_id && c.is_redeemable_at(now))
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }
}

#[async_trait]
impl GrantLedgerPort for InMemoryConsentStore {
    async fn has_grant(
        &self,
        patient_id: &PatientId,
        hospital_id: &HospitalId,
        staff_id: &StaffId,
    ) -> Result<bool, GrantLedgerError> {
        if let Some(msg) = self.storage_failure() {
            return Err(GrantLedgerError::Storage(msg));
        }
        let state = self.state.lock().await;
        Ok(state
            .grants
            .iter()
            .any(|g| g.covers(patient_id, hospital_id, staff_id)))
    }

    async fn list_for_patient(
        &self,
        patient_id: &PatientId,
    ) -> Result<Vec<AccessGrant>, GrantLedgerError> {
        let state = self.state.lock().await;
        let mut grants: Vec<AccessGrant> = state
            .grants
            .iter()
            .filter(|g| &g.patient_id == patient_id)
            .cloned()
            .collect();
        grants.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(grants)
    }

    async fn find_by_challenge(
        &self,
        challenge_id: &ChallengeId,
    ) -> Result<Option<AccessGrant>, GrantLedgerError> {
        let state = self.state.lock().await;
        Ok(state
            .grants
            .iter()
            .find(|g| &g.challenge_id == challenge_id)
            .cloned())
    }
}
