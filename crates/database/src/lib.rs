use std::env;

use async_trait::async_trait;
use ingestion::database::{Database, DatabaseAutocommit, DatabaseError, Result, TripUpdateRepo};
use model::trip_update::{DatedVjKey, RealTimeUpdate, TripUpdate};
use queries::convert_error;
use sqlx::Transaction;

pub mod data_model;
pub mod lock;
pub mod queries;

pub use lock::{PgDistributedLock, PgLockGuard};

pub struct DatabaseConnectionInfo {
    pub username: String,
    pub password: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConnectionInfo {
    pub fn from_env() -> Option<Self> {
        let username = env::var("DATABASE_USER").ok()?;
        let password = env::var("DATABASE_PASSWORD").ok()?;
        let hostname = env::var("DATABASE_HOST").ok()?;
        let port: u16 = env::var("DATABASE_PORT").ok()?.parse().ok()?;
        let database = env::var("DATABASE_NAME").ok()?;
        Some(Self {
            username,
            password,
            hostname,
            port,
            database,
        })
    }

    pub(self) fn postgres_url(self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.hostname, self.port, self.database
        )
    }
}

#[derive(Clone)]
pub struct PgDatabase {
    connection: sqlx::PgPool,
}

pub struct PgDatabaseTransaction<'a> {
    tx: Transaction<'a, sqlx::Postgres>,
}

pub struct PgDatabaseAutocommit {
    pool: sqlx::PgPool,
}

impl DatabaseAutocommit for PgDatabaseAutocommit {}

impl PgDatabase {
    pub async fn connect(
        connection_info: DatabaseConnectionInfo,
    ) -> Result<Self> {
        let url = connection_info.postgres_url();
        let pool = sqlx::postgres::PgPool::connect(&url)
            .await
            .map_err(convert_error)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|why| DatabaseError::Other(Box::new(why)))?;

        Ok(Self { connection: pool })
    }

    /// Exposes the underlying pool for collaborators built on raw
    /// `sqlx::Postgres` primitives outside this crate's own trait impls,
    /// such as [`crate::lock::PgDistributedLock`].
    pub fn pool(&self) -> sqlx::PgPool {
        self.connection.clone()
    }
}

#[async_trait]
impl TripUpdateRepo for PgDatabaseAutocommit {
    async fn find_by_dated_vjs(&mut self, keys: &[DatedVjKey]) -> Result<Vec<TripUpdate>> {
        queries::trip_update::find_by_dated_vjs(&self.pool, keys).await
    }

    async fn put(&mut self, rtu: RealTimeUpdate, trip_updates: &[TripUpdate]) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(convert_error)?;
        queries::trip_update::put(&mut conn, &rtu, trip_updates).await
    }
}

#[async_trait]
impl<'a> TripUpdateRepo for PgDatabaseTransaction<'a> {
    async fn find_by_dated_vjs(&mut self, keys: &[DatedVjKey]) -> Result<Vec<TripUpdate>> {
        queries::trip_update::find_by_dated_vjs(&mut *self.tx, keys).await
    }

    async fn put(&mut self, rtu: RealTimeUpdate, trip_updates: &[TripUpdate]) -> Result<()> {
        queries::trip_update::put(&mut *self.tx, &rtu, trip_updates).await
    }
}

#[async_trait]
impl<'a> ingestion::database::DatabaseTransaction for PgDatabaseTransaction<'a> {
    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(convert_error)
    }
}

#[async_trait]
impl Database for PgDatabase {
    type Transaction = PgDatabaseTransaction<'static>;
    type Autocommit = PgDatabaseAutocommit;

    const BULK_INSERT_MAX: usize = 999;

    fn auto(&self) -> Self::Autocommit {
        PgDatabaseAutocommit {
            pool: self.connection.clone(),
        }
    }

    async fn transaction(&self) -> Result<Self::Transaction> {
        let tx = self.connection.begin().await.map_err(convert_error)?;
        Ok(PgDatabaseTransaction { tx })
    }
}
