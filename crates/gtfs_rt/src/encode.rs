use chrono::Utc;
use prost::Message;

use ingestion::database::FeedEncoder;
use model::contributor::ContributorId;
use model::trip_update::{EventStatus, StopTimeUpdate, TripStatus, TripUpdate};

use crate::proto;

/// Builds the outbound GTFS-RT feed for one contributor's current trip
/// updates: header timestamp, `trip.start_date` yyyymmdd UTC, stop-sequence,
/// delay seconds.
pub struct GtfsRtEncoder;

impl FeedEncoder for GtfsRtEncoder {
    fn encode(&self, trip_updates: &[TripUpdate], _contributor: &ContributorId) -> Vec<u8> {
        let header = proto::FeedHeader {
            gtfs_realtime_version: "2.0".to_owned(),
            incrementality: Some(proto::feed_header::Incrementality::FullDataset as i32),
            timestamp: Some(Utc::now().timestamp() as u64),
        };
        let entity = trip_updates
            .iter()
            .enumerate()
            .map(|(index, tu)| encode_entity(index, tu))
            .collect();

        proto::FeedMessage {
            header,
            entity,
        }
        .encode_to_vec()
    }
}

fn encode_entity(index: usize, tu: &TripUpdate) -> proto::FeedEntity {
    let trip = proto::TripDescriptor {
        trip_id: Some(tu.vj_key.trip_id.raw()),
        start_date: Some(tu.vj_key.utc_start_timestamp.date().format("%Y%m%d").to_string()),
        schedule_relationship: Some(encode_trip_status(tu.status) as i32),
    };

    let stop_time_update = tu.stop_time_updates.iter().map(encode_stop).collect();

    proto::FeedEntity {
        id: format!("{}-{}", tu.vj_key.trip_id.raw(), index),
        is_deleted: None,
        trip_update: Some(proto::TripUpdate {
            trip,
            stop_time_update,
            timestamp: Some(Utc::now().timestamp() as u64),
        }),
    }
}

fn encode_trip_status(status: TripStatus) -> proto::trip_descriptor::ScheduleRelationship {
    use proto::trip_descriptor::ScheduleRelationship;
    match status {
        TripStatus::None | TripStatus::Update => ScheduleRelationship::Scheduled,
        TripStatus::Delete => ScheduleRelationship::Canceled,
        TripStatus::Add => ScheduleRelationship::Added,
    }
}

fn encode_stop(stu: &StopTimeUpdate) -> proto::trip_update::StopTimeUpdate {
    proto::trip_update::StopTimeUpdate {
        stop_sequence: Some(stu.order as u32),
        stop_id: Some(stu.stop_point.raw()),
        arrival: encode_event(stu.arrival_delay, stu.arrival_status),
        departure: encode_event(stu.departure_delay, stu.departure_status),
        schedule_relationship: Some(encode_stop_status(stu.arrival_status, stu.departure_status) as i32),
    }
}

fn encode_event(
    delay: chrono::Duration,
    status: EventStatus,
) -> Option<proto::trip_update::StopTimeEvent> {
    if status == EventStatus::None {
        return None;
    }
    Some(proto::trip_update::StopTimeEvent {
        delay: Some(delay.num_seconds() as i32),
        time: None,
    })
}

fn encode_stop_status(
    arrival: EventStatus,
    departure: EventStatus,
) -> proto::trip_update::stop_time_update::ScheduleRelationship {
    use proto::trip_update::stop_time_update::ScheduleRelationship;
    if arrival.is_deleted() && departure.is_deleted() {
        ScheduleRelationship::Skipped
    } else {
        ScheduleRelationship::Scheduled
    }
}
