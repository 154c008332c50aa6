//! Configuration data for the consent exchange.

mod consent_config;

pub use consent_config::{ConfigError, ConsentConfig};
