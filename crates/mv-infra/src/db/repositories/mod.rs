mod challenge_repo;
mod grant_repo;

pub use challenge_repo::*;
pub use grant_repo::*;
