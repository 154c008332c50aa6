//! Normalized staff identity.
//!
//! The identity/session provider authenticates a hospital staff member and
//! produces exactly one [`StaffIdentity`]. Use cases receive it explicitly; they
//! never look the caller up themselves.

use serde::{Deserialize, Serialize};

use crate::consent::ConsentError;
use crate::ids::{HospitalId, StaffId};

/// Role of a staff member at their hospital.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Staff,
    Doctor,
    Admin,
}

impl StaffRole {
    /// Numeric role code used by the identity provider's staff table.
    pub const DOCTOR_CODE: i32 = 3;
    pub const ADMIN_CODE: i32 = 9;

    pub fn from_code(code: i32) -> Self {
        match code {
            Self::DOCTOR_CODE => StaffRole::Doctor,
            Self::ADMIN_CODE => StaffRole::Admin,
            _ => StaffRole::Staff,
        }
    }

    /// Whether the role may amend medical records written at its own hospital.
    pub fn is_privileged(&self) -> bool {
        matches!(self, StaffRole::Doctor)
    }
}

/// The authenticated caller as seen by the consent core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffIdentity {
    pub staff_id: StaffId,
    pub hospital_id: HospitalId,
    pub role: StaffRole,
}

impl StaffIdentity {
    /// Builds an identity, rejecting blank staff or hospital ids.
    pub fn new(
        staff_id: impl Into<StaffId>,
        hospital_id: impl Into<HospitalId>,
        role: StaffRole,
    ) -> Result<Self, ConsentError> {
        let staff_id = staff_id.into();
        let hospital_id = hospital_id.into();
        if staff_id.is_blank() {
            return Err(ConsentError::missing("staff_id"));
        }
        if hospital_id.is_blank() {
            return Err(ConsentError::missing("hospital_id"));
        }
        Ok(Self {
            staff_id,
            hospital_id,
            role,
        })
    }

    pub fn works_at(&self, hospital_id: &HospitalId) -> bool {
        &self.hospital_id == hospital_id
    }
}
