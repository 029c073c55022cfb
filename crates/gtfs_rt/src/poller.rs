use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use ingestion::coordinator::{ingest, RawTripUpdate};
use ingestion::database::{Database, DistributedLock, FeedEncoder, Publisher, ScheduleClient};
use ingestion::poller::{Continuation, Poller};
use model::contributor::ContributorId;
use model::trip_update::RealTimeUpdate;

use crate::decode::decode_feed;

#[derive(Debug)]
pub enum PollError {
    Http(reqwest::Error),
    Ingestion(ingestion::IngestionError),
}

impl From<reqwest::Error> for PollError {
    fn from(why: reqwest::Error) -> Self {
        Self::Http(why)
    }
}

impl From<ingestion::IngestionError> for PollError {
    fn from(why: ingestion::IngestionError) -> Self {
        Self::Ingestion(why)
    }
}

/// One contributor's GTFS-RT polling loop: a HEAD request checks the ETag
/// before bothering with the full download, a per-contributor lock makes
/// concurrent polls of the same contributor a no-op, and the actual merge
/// goes through [`ingest`] exactly like the HTTP ingress path does.
pub struct GtfsRtPoller<S, D, P, E, L: DistributedLock> {
    contributor: ContributorId,
    feed_url: String,
    http: reqwest::Client,
    http_timeout: Duration,
    poll_interval: Duration,
    last_etag: Option<String>,
    schedule: S,
    database: D,
    publisher: P,
    encoder: E,
    lock: L,
}

impl<S, D, P, E, L> GtfsRtPoller<S, D, P, E, L>
where
    L: DistributedLock,
{
    pub fn new(
        contributor: ContributorId,
        feed_url: String,
        http_timeout: Duration,
        poll_interval: Duration,
        schedule: S,
        database: D,
        publisher: P,
        encoder: E,
        lock: L,
    ) -> Self {
        Self {
            contributor,
            feed_url,
            http: reqwest::Client::new(),
            http_timeout,
            poll_interval,
            last_etag: None,
            schedule,
            database,
            publisher,
            encoder,
            lock,
        }
    }

    /// Mirrors `_is_newer`: any failure to check the ETag is swallowed and
    /// treated as "assume it changed, poll anyway".
    async fn has_changed(&mut self) -> bool {
        let Ok(response) = self.http.head(&self.feed_url).timeout(self.http_timeout).send().await else {
            return true;
        };
        let Some(etag) = response.headers().get("etag").and_then(|v| v.to_str().ok()) else {
            return true;
        };
        if self.last_etag.as_deref() == Some(etag) {
            return false;
        }
        self.last_etag = Some(etag.to_owned());
        true
    }
}

#[async_trait]
impl<S, D, P, E, L> Poller for GtfsRtPoller<S, D, P, E, L>
where
    S: ScheduleClient + Send + Sync,
    D: Database + Send + Sync,
    P: Publisher + Send + Sync,
    E: FeedEncoder + Send + Sync,
    L: DistributedLock + Send + Sync,
{
    type Error = PollError;

    fn contributor_name(&self) -> &str {
        self.contributor.raw_ref::<str>()
    }

    async fn poll_once(&mut self) -> Result<Continuation, Self::Error> {
        if !self.has_changed().await {
            return Ok(Continuation::Continue);
        }

        let Some(_guard) = self.lock.try_acquire(self.contributor_name()).await else {
            log::debug!("skipping poll for {}: already locked", self.contributor.raw());
            return Ok(Continuation::Continue);
        };

        let response = self.http.get(&self.feed_url).timeout(self.http_timeout).send().await?;
        let bytes = response.bytes().await?;

        let decoded = match decode_feed(&bytes) {
            Ok(decoded) => decoded,
            Err(why) => {
                log::warn!("discarding undecodable gtfs-rt feed from {}: {:?}", self.contributor.raw(), why);
                return Ok(Continuation::Continue);
            }
        };

        let mut raw_trip_updates = Vec::with_capacity(decoded.len());
        for decoded_tu in decoded {
            match self
                .schedule
                .get_vehicle_journey(&decoded_tu.trip_id, decoded_tu.start_date)
                .await
            {
                Ok(vj) => {
                    let trip_update = crate::assemble::to_trip_update(decoded_tu, &vj, &self.contributor);
                    raw_trip_updates.push(RawTripUpdate { vj, trip_update });
                }
                Err(why) => {
                    log::warn!(
                        "dropping trip update for unknown trip {:?}: {:?}",
                        decoded_tu.trip_id,
                        why
                    );
                }
            }
        }

        let rtu = RealTimeUpdate::new(
            bytes.to_vec(),
            "gtfs-rt".to_owned(),
            self.contributor.clone(),
            Utc::now(),
        );

        let outcome = ingest(
            &self.database,
            &self.publisher,
            &self.encoder,
            rtu,
            raw_trip_updates,
            false,
        )
        .await?;

        log::info!(
            "gtfs-rt poll for {}: persisted {}, rejected {}, published {}",
            self.contributor.raw(),
            outcome.persisted,
            outcome.rejected,
            outcome.published
        );

        Ok(Continuation::Continue)
    }

    fn tick(&self) -> Duration {
        self.poll_interval
    }
}
