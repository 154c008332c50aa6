//! MediVault application layer
//!
//! This crate contains the consent exchange use cases: issuing challenges,
//! redeeming codes into access grants and answering access questions for the
//! record features.

pub mod usecases;

pub use usecases::consent::{
    CheckAccess, IssueChallenge, ListPatientGrants, ListPendingChallenges, PendingRequest,
    RecordAccessPolicy, RedeemChallenge,
};
pub use usecases::retry::{retry_storage, RetryPolicy};
