//! Seams between the consent repositories and diesel.

use diesel::SqliteConnection;

/// Lends a pooled SQLite connection to one unit of repository work.
///
/// Repositories open their own transactions inside `f`; the executor only
/// hands out the connection and returns it to the pool afterwards.
pub trait DbExecutor: Send + Sync {
    fn run<T>(
        &self,
        f: impl FnOnce(&mut SqliteConnection) -> anyhow::Result<T>,
    ) -> anyhow::Result<T>;
}

/// Domain value to insertable row, e.g. `Challenge` to `NewChallengeRow`.
pub trait InsertMapper<D, R>: Send + Sync {
    fn to_row(&self, domain: &D) -> anyhow::Result<R>;
}

/// Queried row back to the domain value. Fails on rows the domain cannot
/// represent, such as out-of-range timestamps or unknown consumed reasons.
pub trait RowMapper<R, D>: Send + Sync {
    fn to_domain(&self, row: &R) -> anyhow::Result<D>;
}
