//! ID type wrappers for type safety.
//!
//! Patient, hospital and staff ids come from outside the core (record store and
//! identity provider) and are opaque here. Challenge and grant ids are assigned
//! by the core.

mod id_macro;

use serde::{Deserialize, Serialize};

use id_macro::{impl_generated_id, impl_id};

/// Identifier of a pending or resolved challenge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeId(String);

/// Identifier of a durable access grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrantId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HospitalId(String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(String);

impl_id!(ChallengeId, GrantId, PatientId, HospitalId, StaffId);
impl_generated_id!(ChallengeId, GrantId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ChallengeId::new();
        let b = ChallengeId::new();
        assert_ne!(a, b);
        assert!(!a.is_blank());
    }

    #[test]
    fn test_external_id_from_str() {
        let id: PatientId = "patient-1".into();
        assert_eq!(id.as_str(), "patient-1");
        assert_eq!(id.to_string(), "patient-1");
    }

    #[test]
    fn test_blank_detection_trims_whitespace() {
        assert!(StaffId::from("   ").is_blank());
        assert!(HospitalId::from("").is_blank());
        assert!(!HospitalId::from(" h1 ").is_blank());
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = GrantId::from("grant-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"grant-1\"");
    }
}
