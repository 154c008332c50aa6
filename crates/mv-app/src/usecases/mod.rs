//! Business logic use cases
//!
//! Hospital side:  IssueChallenge → (code delivered out of band) → RedeemChallenge
//! Patient side:   ListPendingChallenges, ListPatientGrants
//! Record features: CheckAccess / RecordAccessPolicy before exposing data

pub mod consent;
pub mod retry;
