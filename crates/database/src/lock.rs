use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use ingestion::database::{DistributedLock, LockGuard};
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPool;
use sqlx::{Executor, Postgres};

/// Per-contributor mutual exclusion backed by `pg_try_advisory_lock`,
/// following `PgDatabaseTransaction`/`PgDatabaseAutocommit`'s existing
/// pattern of wrapping raw `sqlx::Postgres` primitives. Acquisition is
/// non-blocking: a contended lock simply returns `None`.
#[derive(Clone)]
pub struct PgDistributedLock {
    pool: PgPool,
}

impl PgDistributedLock {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn lock_key(name: &str) -> i64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    hasher.finish() as i64
}

/// Held for as long as a contributor's advisory lock is taken.
/// `pg_try_advisory_lock`/`pg_advisory_unlock` are session-scoped, so the
/// connection the lock was acquired on is kept checked out of the pool for
/// the guard's whole lifetime; dropping the guard unlocks it before the
/// connection is released back to the pool.
pub struct PgLockGuard {
    key: i64,
    connection: Option<PoolConnection<Postgres>>,
}

impl LockGuard for PgLockGuard {}

impl Drop for PgLockGuard {
    fn drop(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };
        let key = self.key;
        tokio::spawn(async move {
            let _ = connection
                .execute(sqlx::query("SELECT pg_advisory_unlock($1);").bind(key))
                .await;
        });
    }
}

#[async_trait]
impl DistributedLock for PgDistributedLock {
    type Guard = PgLockGuard;

    async fn try_acquire(&self, name: &str) -> Option<Self::Guard> {
        let key = lock_key(name);
        let mut connection = self.pool.acquire().await.ok()?;
        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_lock($1);")
            .bind(key)
            .fetch_one(&mut *connection)
            .await
            .ok()?;

        if acquired {
            Some(PgLockGuard {
                key,
                connection: Some(connection),
            })
        } else {
            None
        }
    }
}
