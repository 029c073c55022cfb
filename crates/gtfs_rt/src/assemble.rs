use chrono::{Duration, NaiveDateTime};

use model::contributor::ContributorId;
use model::trip::VehicleJourney;
use model::trip_update::{EventStatus, StopTimeUpdate, TripStatus, TripUpdate};

use crate::decode::{DecodedEvent, DecodedStopTimeUpdate, DecodedTripUpdate};

/// Turns one decoded trip update into the `new` parameter `merge::merge`
/// expects, now that a theoretical vehicle journey is available to resolve
/// absolute timestamps into delays.
pub fn to_trip_update(
    decoded: DecodedTripUpdate,
    vj: &VehicleJourney,
    contributor: &ContributorId,
) -> TripUpdate {
    let mut tu = TripUpdate::new(vj.dated_key(), contributor.clone());
    tu.status = decoded.status;

    if tu.status == TripStatus::Delete {
        return tu;
    }

    tu.stop_time_updates = decoded
        .stop_time_updates
        .into_iter()
        .map(|stu| assemble_stop(stu, vj))
        .collect();
    tu
}

fn assemble_stop(decoded: DecodedStopTimeUpdate, vj: &VehicleJourney) -> StopTimeUpdate {
    if decoded.skipped {
        return StopTimeUpdate {
            stop_point: decoded.stop_point,
            order: decoded.order,
            arrival: None,
            departure: None,
            arrival_delay: Duration::zero(),
            departure_delay: Duration::zero(),
            arrival_status: EventStatus::Delete,
            departure_status: EventStatus::Delete,
            message: None,
        };
    }

    let theoretical = vj.find_stop(&decoded.stop_point);
    let base_arrival = theoretical
        .and_then(|stop| stop.utc_arrival_time)
        .map(|time| vj.utc_circulation_date.and_time(time));
    let base_departure = theoretical
        .and_then(|stop| stop.utc_departure_time)
        .map(|time| vj.utc_circulation_date.and_time(time));

    let (arrival_delay, arrival_status) = resolve_event(decoded.arrival, base_arrival);
    let (departure_delay, departure_status) = resolve_event(decoded.departure, base_departure);

    StopTimeUpdate {
        stop_point: decoded.stop_point,
        order: decoded.order,
        arrival: None,
        departure: None,
        arrival_delay,
        departure_delay,
        arrival_status,
        departure_status,
        message: None,
    }
}

fn resolve_event(event: DecodedEvent, base: Option<NaiveDateTime>) -> (Duration, EventStatus) {
    match event {
        DecodedEvent::None => (Duration::zero(), EventStatus::None),
        DecodedEvent::Delay(delay) => (delay, EventStatus::Update),
        DecodedEvent::Absolute(at) => match base {
            Some(base) => (at.naive_utc() - base, EventStatus::Update),
            None => (Duration::zero(), EventStatus::None),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use model::trip::TheoreticalStopTime;
    use utility::id::Id;

    fn vj() -> VehicleJourney {
        VehicleJourney::new(
            Id::new("R:vj1".to_owned()),
            NaiveDate::from_ymd_opt(2012, 6, 15).unwrap(),
            vec![TheoreticalStopTime::new(
                Id::new("StopR2".to_owned()),
                Some(chrono::NaiveTime::from_hms_opt(14, 30, 0).unwrap()),
                Some(chrono::NaiveTime::from_hms_opt(14, 30, 0).unwrap()),
            )],
        )
    }

    fn decoded() -> DecodedTripUpdate {
        DecodedTripUpdate {
            trip_id: Id::new("R:vj1".to_owned()),
            start_date: NaiveDate::from_ymd_opt(2012, 6, 15).unwrap(),
            status: TripStatus::Update,
            stop_time_updates: vec![DecodedStopTimeUpdate {
                stop_point: Id::new("StopR2".to_owned()),
                order: 0,
                arrival: DecodedEvent::Delay(Duration::seconds(60)),
                departure: DecodedEvent::None,
                skipped: false,
            }],
        }
    }

    #[test]
    fn carries_a_plain_delay_through() {
        let vj = vj();
        let tu = to_trip_update(decoded(), &vj, &Id::new("c1".to_owned()));
        assert_eq!(tu.stop_time_updates.len(), 1);
        assert_eq!(tu.stop_time_updates[0].arrival_delay, Duration::seconds(60));
        assert_eq!(tu.stop_time_updates[0].arrival_status, EventStatus::Update);
    }

    #[test]
    fn a_skipped_stop_becomes_a_delete() {
        let vj = vj();
        let mut decoded = decoded();
        decoded.stop_time_updates[0].skipped = true;
        let tu = to_trip_update(decoded, &vj, &Id::new("c1".to_owned()));
        assert_eq!(tu.stop_time_updates[0].arrival_status, EventStatus::Delete);
    }

    #[test]
    fn a_cancelled_trip_carries_no_stop_time_updates() {
        let vj = vj();
        let mut decoded = decoded();
        decoded.status = TripStatus::Delete;
        let tu = to_trip_update(decoded, &vj, &Id::new("c1".to_owned()));
        assert!(tu.stop_time_updates.is_empty());
        assert_eq!(tu.status, TripStatus::Delete);
    }
}
