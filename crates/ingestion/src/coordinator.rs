use std::collections::HashMap;

use model::contributor::ContributorId;
use model::trip::VehicleJourney;
use model::trip_update::{DatedVjKey, RealTimeUpdate, TripUpdate};

use merge::MergeOutcome;

use crate::database::{Database, FeedEncoder, Publisher, PublishError, TripUpdateRepo};
use crate::IngestionError;

/// One incoming trip update paired with the theoretical vehicle journey it
/// was matched against by the caller (the `ScheduleClient` lookup happens
/// before `ingest` is called, so the coordinator itself never needs to know
/// how schedule lookups are cached or retried).
pub struct RawTripUpdate {
    pub vj: VehicleJourney,
    pub trip_update: TripUpdate,
}

#[derive(Debug)]
pub struct IngestOutcome {
    pub persisted: usize,
    pub rejected: usize,
    pub published: bool,
}

/// Runs one real-time update through the merge core, persists whatever
/// changed, and publishes the contributor's resulting feed. Generic over
/// the three external collaborators so the merge core underneath never
/// touches concrete I/O.
pub async fn ingest<D, P, E>(
    database: &D,
    publisher: &P,
    encoder: &E,
    rtu: RealTimeUpdate,
    raw_trip_updates: Vec<RawTripUpdate>,
    is_new_complete: bool,
) -> Result<IngestOutcome, IngestionError>
where
    D: Database,
    P: Publisher,
    E: FeedEncoder,
{
    let contributor = rtu.contributor.clone();
    let keys: Vec<DatedVjKey> = raw_trip_updates
        .iter()
        .map(|raw| raw.trip_update.vj_key.clone())
        .collect();

    let (rtu, persisted, rejected) = database
        .perform_transaction(|tx| {
            let keys = keys.clone();
            Box::pin(async move {
                let existing = tx.find_by_dated_vjs(&keys).await?;
                let mut by_key: HashMap<DatedVjKey, TripUpdate> = existing
                    .into_iter()
                    .map(|tu| (tu.vj_key.clone(), tu))
                    .collect();

                let mut rejected = 0usize;
                let mut persisted = Vec::with_capacity(raw_trip_updates.len());
                let mut linked = Vec::with_capacity(raw_trip_updates.len());
                for raw in raw_trip_updates {
                    let key = raw.trip_update.vj_key.clone();
                    let db_tu = by_key.remove(&key);
                    let outcome = merge::merge(&raw.vj, db_tu, raw.trip_update, is_new_complete);
                    let changed = match outcome {
                        MergeOutcome::Changed(tu) => tu,
                        MergeOutcome::Unchanged => continue,
                    };
                    match merge::enforce(changed) {
                        Ok(tu) => {
                            linked.push(tu.vj_key.clone());
                            persisted.push(tu);
                        }
                        Err(why) => {
                            log::warn!("dropping malformed trip update: {:?}", why);
                            rejected += 1;
                        }
                    }
                }

                let mut rtu = rtu;
                rtu.linked_trip_updates = linked;
                tx.put(rtu.clone(), &persisted).await?;
                Ok((rtu, persisted, rejected))
            })
        })
        .await?;

    let published = publish_current_feed(database, publisher, encoder, &contributor, &persisted)
        .await
        .is_ok();

    Ok(IngestOutcome {
        persisted: persisted.len(),
        rejected,
        published,
    })
}

/// Publishing happens after the transaction has already committed: a
/// publish failure does not roll back the persisted merge.
async fn publish_current_feed<D, P, E>(
    _database: &D,
    publisher: &P,
    encoder: &E,
    contributor: &ContributorId,
    trip_updates: &[TripUpdate],
) -> Result<(), PublishError>
where
    D: Database,
    P: Publisher,
    E: FeedEncoder,
{
    let feed = encoder.encode(trip_updates, contributor);
    publisher.publish(feed, contributor).await
}
