//! MediVault: a patient-consent exchange that lets hospital staff view a
//! patient's records only after the patient hands over a one-time code.
//!
//! The consent logic lives in the workspace crates; this crate wires them
//! together and exposes the command handlers used by the `medivault` binary.

pub mod bootstrap;
pub mod commands;
