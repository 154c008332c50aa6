mod check_access;
mod issue_challenge;
mod list_patient_grants;
mod list_pending_challenges;
mod record_access;
mod redeem_challenge;

#[cfg(test)]
pub(crate) mod test_support;

pub use check_access::CheckAccess;
pub use issue_challenge::IssueChallenge;
pub use list_patient_grants::ListPatientGrants;
pub use list_pending_challenges::{ListPendingChallenges, PendingRequest};
pub use record_access::RecordAccessPolicy;
pub use redeem_challenge::RedeemChallenge;
