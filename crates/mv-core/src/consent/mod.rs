//! Consent exchange domain: challenges, grants and one-time codes.
//!
//! Flow: issue challenge → patient receives code out of band → hospital redeems
//! code → access grant recorded.

mod challenge;
mod error;
mod grant;
pub mod otp;

pub use challenge::{Challenge, ChallengeRequest, ConsumedReason};
pub use error::ConsentError;
pub use grant::AccessGrant;
pub use otp::{CodeOrigin, GeneratedCode, OtpCode, OtpGenerator};
