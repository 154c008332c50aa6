//! # mv-core
//!
//! Core domain models and business rules for the MediVault consent exchange.
//!
//! This crate contains pure business logic without any infrastructure dependencies:
//! challenge / grant models, the one-time code generator, the error taxonomy and the
//! ports implemented by the storage layer.

pub mod config;
pub mod consent;
pub mod identity;
pub mod ids;
pub mod ports;

// Re-export commonly used types at the crate root
pub use config::ConsentConfig;
pub use consent::{
    AccessGrant, Challenge, ChallengeRequest, ConsentError, ConsumedReason, OtpCode,
    OtpGenerator,
};
pub use identity::{StaffIdentity, StaffRole};
pub use ids::{ChallengeId, GrantId, HospitalId, PatientId, StaffId};
