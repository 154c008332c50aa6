pub mod access_grant_row;
pub mod challenge_row;

pub use access_grant_row::{AccessGrantRow, NewAccessGrantRow};
pub use challenge_row::{ChallengeRow, NewChallengeRow};
