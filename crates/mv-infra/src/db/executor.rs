use std::sync::Arc;

use anyhow::Context;
use diesel::SqliteConnection;

use crate::db::pool::DbPool;
use crate::db::ports::DbExecutor;

/// Runs repository work on a connection checked out of the r2d2 pool.
///
/// Cloning shares the pool, so the challenge store and the grant ledger can
/// use one set of connections.
#[derive(Clone)]
pub struct DieselSqliteExecutor {
    pool: Arc<DbPool>,
}

impl DieselSqliteExecutor {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

impl DbExecutor for DieselSqliteExecutor {
    fn run<T>(
        &self,
        f: impl FnOnce(&mut SqliteConnection) -> anyhow::Result<T>,
    ) -> anyhow::Result<T> {
        let mut conn = self.pool.get().with_context(|| {
            let state = self.pool.state();
            format!(
                "No SQLite connection available ({} open, {} idle)",
                state.connections, state.idle_connections
            )
        })?;
        f(&mut conn)
    }
}
