use chrono::{NaiveDate, TimeZone, Utc};
use prost::Message;

use model::stop::StopPointRef;
use model::trip::TripId;
use model::trip_update::TripStatus;
use utility::id::Id;

use crate::proto;
use crate::proto::trip_descriptor::ScheduleRelationship as TripScheduleRelationship;
use crate::proto::trip_update::stop_time_update::ScheduleRelationship as StopScheduleRelationship;

#[derive(Debug)]
pub enum DecodeError {
    Protobuf(prost::DecodeError),
}

impl From<prost::DecodeError> for DecodeError {
    fn from(why: prost::DecodeError) -> Self {
        Self::Protobuf(why)
    }
}

/// A stop event the feed reported, before it is weighed against a
/// theoretical schedule: either a plain delay, an absolute timestamp that
/// still needs a base time to become a delay, or nothing at all.
#[derive(Debug, Clone, Copy)]
pub enum DecodedEvent {
    None,
    Delay(chrono::Duration),
    Absolute(chrono::DateTime<Utc>),
}

#[derive(Debug, Clone)]
pub struct DecodedStopTimeUpdate {
    pub stop_point: StopPointRef,
    pub order: usize,
    pub arrival: DecodedEvent,
    pub departure: DecodedEvent,
    pub skipped: bool,
}

/// One decoded trip update, not yet matched against a theoretical vehicle
/// journey: the schedule lookup and the delay-vs-theoretical arithmetic
/// both need a `VehicleJourney`, which this crate's decoder never has —
/// see [`crate::assemble::to_trip_update`].
#[derive(Debug, Clone)]
pub struct DecodedTripUpdate {
    pub trip_id: TripId,
    pub start_date: NaiveDate,
    pub status: TripStatus,
    pub stop_time_updates: Vec<DecodedStopTimeUpdate>,
}

pub fn decode_feed(bytes: &[u8]) -> Result<Vec<DecodedTripUpdate>, DecodeError> {
    let message = proto::FeedMessage::decode(bytes)?;
    Ok(message
        .entity
        .into_iter()
        .filter_map(|entity| entity.trip_update)
        .filter_map(decode_trip_update)
        .collect())
}

fn decode_trip_update(trip_update: proto::TripUpdate) -> Option<DecodedTripUpdate> {
    let trip_id = trip_update.trip.trip_id.clone()?;
    let start_date = trip_update
        .trip
        .start_date
        .as_deref()
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y%m%d").ok())?;

    let status = match trip_update.trip.schedule_relationship() {
        TripScheduleRelationship::Canceled => TripStatus::Delete,
        TripScheduleRelationship::Added => TripStatus::Add,
        TripScheduleRelationship::Scheduled | TripScheduleRelationship::Unscheduled => {
            TripStatus::Update
        }
    };

    let stop_time_updates = trip_update
        .stop_time_update
        .into_iter()
        .enumerate()
        .map(|(fallback_order, stu)| decode_stop_time_update(stu, fallback_order))
        .collect();

    Some(DecodedTripUpdate {
        trip_id: Id::new(trip_id),
        start_date,
        status,
        stop_time_updates,
    })
}

fn decode_stop_time_update(
    stu: proto::trip_update::StopTimeUpdate,
    fallback_order: usize,
) -> DecodedStopTimeUpdate {
    let order = stu
        .stop_sequence
        .map(|seq| seq as usize)
        .unwrap_or(fallback_order);
    let stop_point: StopPointRef = Id::new(stu.stop_id.clone().unwrap_or_default());
    let skipped = stu.schedule_relationship() == StopScheduleRelationship::Skipped;

    DecodedStopTimeUpdate {
        stop_point,
        order,
        arrival: decode_event(stu.arrival.as_ref()),
        departure: decode_event(stu.departure.as_ref()),
        skipped,
    }
}

fn decode_event(event: Option<&proto::trip_update::StopTimeEvent>) -> DecodedEvent {
    let Some(event) = event else {
        return DecodedEvent::None;
    };
    if let Some(delay) = event.delay {
        return DecodedEvent::Delay(chrono::Duration::seconds(delay as i64));
    }
    if let Some(time) = event.time {
        if let chrono::LocalResult::Single(at) = Utc.timestamp_opt(time, 0) {
            return DecodedEvent::Absolute(at);
        }
    }
    DecodedEvent::None
}
