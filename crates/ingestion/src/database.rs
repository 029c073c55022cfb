use std::error;
use std::fmt::Debug;

use async_trait::async_trait;
use chrono::NaiveDate;

use model::trip::{TripId, VehicleJourney};
use model::trip_update::{DatedVjKey, RealTimeUpdate, TripUpdate};

/// Schedule lookup failed to produce a theoretical vehicle journey for a
/// `(trip_id, date)` pair. The real schedule store is out of scope; this
/// crate only ships an in-memory stub against this error (see
/// [`crate::testing::StaticScheduleClient`]).
#[derive(Debug)]
pub enum ScheduleLookupError {
    NotFound,
    Other(Box<dyn error::Error + Send + Sync>),
}

/// Read-only access to the theoretical schedule, keyed by the same
/// `(trip_id, date)` pair a dated VJ key carries.
#[async_trait]
pub trait ScheduleClient: Send + Sync {
    async fn get_vehicle_journey(
        &self,
        trip_id: &TripId,
        date: NaiveDate,
    ) -> std::result::Result<VehicleJourney, ScheduleLookupError>;
}

#[derive(Debug)]
pub enum DatabaseError {
    NotFound,
    Other(Box<dyn error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Read/write access to the previously-merged trip updates, keyed by
/// `DatedVjKey` rather than by row id: the merge core never mints its own
/// identity, it only ever asks "is there already something under this key".
#[async_trait]
pub trait TripUpdateRepo {
    async fn find_by_dated_vjs(&mut self, keys: &[DatedVjKey]) -> Result<Vec<TripUpdate>>;

    /// Persists the real-time update together with the trip updates it
    /// produced, replacing whichever trip update previously lived under
    /// each key. Must be called with at most
    /// [`Database::BULK_INSERT_MAX`] trip updates at once.
    async fn put(
        &mut self,
        rtu: RealTimeUpdate,
        trip_updates: &[TripUpdate],
    ) -> Result<()>;
}

#[derive(Debug)]
pub enum PublishError {
    Unreachable(Box<dyn error::Error + Send + Sync>),
    Rejected(String),
}

/// Sends an already-encoded outbound feed to the downstream broker. Kept
/// as a trait, not a concrete HTTP client, so unit tests of the coordinator
/// can substitute a recording fake instead of a real network call.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        feed: Vec<u8>,
        contributor: &model::contributor::ContributorId,
    ) -> std::result::Result<(), PublishError>;
}

/// Encodes a contributor's current trip updates into the downstream wire
/// format. Kept out of this crate's dependency tree (the protobuf codec
/// lives in `gtfs_rt`) so the coordinator stays agnostic of the feed format.
pub trait FeedEncoder: Send + Sync {
    fn encode(
        &self,
        trip_updates: &[TripUpdate],
        contributor: &model::contributor::ContributorId,
    ) -> Vec<u8>;
}

/// Held while a contributor's lock is acquired; the lock is released when
/// this guard is dropped.
pub trait LockGuard: Send {}

/// Per-contributor mutual exclusion so two concurrent pollers never run the
/// merge core over the same contributor's data at once. Acquisition is
/// non-blocking: a contended lock returns `None` rather than waiting,
/// matching the "concurrent attempts must no-op" requirement.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    type Guard: LockGuard;

    async fn try_acquire(&self, name: &str) -> Option<Self::Guard>;
}

#[async_trait]
pub trait DatabaseTransaction: TripUpdateRepo + Send {
    async fn commit(self) -> Result<()>;
}

pub trait DatabaseAutocommit: TripUpdateRepo {}

/// Persistence for the merge core's output. Multiple concurrent accesses
/// should be possible by cloning the database object.
#[async_trait]
pub trait Database: Clone + Send + Sync + Sized {
    type Transaction: DatabaseTransaction;
    type Autocommit: DatabaseAutocommit + Send;

    const BULK_INSERT_MAX: usize;

    async fn transaction(&self) -> Result<Self::Transaction>;

    fn auto(&self) -> Self::Autocommit;

    async fn perform_transaction<T, F>(&self, action: F) -> Result<T>
    where
        T: Send,
        F: Send + for<'a> FnOnce(&'a mut Self::Transaction) -> futures::future::BoxFuture<'a, Result<T>>,
    {
        let mut tx = self.transaction().await?;
        let result = action(&mut tx).await?;
        tx.commit().await?;
        Ok(result)
    }
}
