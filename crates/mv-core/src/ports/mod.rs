//! Port interfaces for the application layer
//!
//! Ports define the contract between the consent use cases and the storage
//! implementations, keeping the core independent of the database engine.

mod challenge_repository;
mod clock;
pub mod errors;
mod grant_ledger;

pub use challenge_repository::{ChallengeRepositoryPort, RedemptionOutcome};
pub use clock::ClockPort;
pub use errors::{ChallengeStoreError, GrantLedgerError};
pub use grant_ledger::GrantLedgerPort;
