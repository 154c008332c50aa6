//! # mv-infra
//!
//! SQLite storage for the MediVault consent exchange: the challenge store and
//! grant ledger repositories, their diesel models and mappers, the pooled
//! executor, and the system clock.

pub mod clock;
pub mod db;

pub use clock::SystemClock;
