pub mod config;
pub mod tracing;
pub mod wiring;

pub use config::{load_config, AppConfig};
pub use wiring::{wire_consent_runtime, wire_consent_runtime_with_clock, ConsentRuntime};
