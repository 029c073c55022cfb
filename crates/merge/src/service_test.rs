use model::stop::StopPointRef;
use model::trip::TheoreticalStopTime;
use model::trip_update::{EventStatus, StopTimeUpdate, TripUpdate};

/// Which half of a stop-time pair is under consideration. A typed enum and
/// direct field accessors, rather than runtime attribute-name
/// string-building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Arrival,
    Departure,
}

impl EventKind {
    pub fn status_of(self, stu: &StopTimeUpdate) -> EventStatus {
        match self {
            EventKind::Arrival => stu.arrival_status,
            EventKind::Departure => stu.departure_status,
        }
    }

    pub fn theoretical_time_of(self, stop: &TheoreticalStopTime) -> Option<chrono::NaiveTime> {
        match self {
            EventKind::Arrival => stop.utc_arrival_time,
            EventKind::Departure => stop.utc_departure_time,
        }
    }
}

/// Decides whether `event` is currently served at `stop_point`/`order`.
/// The most recent explicit decision wins: the incoming STU if present,
/// else the stored DB STU, else the theoretical schedule.
pub fn is_stop_event_served(
    theoretical_stop: &TheoreticalStopTime,
    stop_point: &StopPointRef,
    order: usize,
    event: EventKind,
    new: Option<&StopTimeUpdate>,
    db: Option<&TripUpdate>,
) -> bool {
    if let Some(new_stu) = new {
        return !event.status_of(new_stu).is_deleted();
    }

    if let Some(db_tu) = db {
        if let Some(db_stu) = db_tu.find(stop_point, order) {
            return !event.status_of(db_stu).is_deleted();
        }
    }

    event.theoretical_time_of(theoretical_stop).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use model::contributor::ContributorId;
    use model::trip_update::{DatedVjKey, TripStatus};
    use utility::id::Id;

    fn stop(arrival: Option<NaiveTime>, departure: Option<NaiveTime>) -> TheoreticalStopTime {
        TheoreticalStopTime::new(Id::new("StopR1".to_owned()), arrival, departure)
    }

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn new_stu_prevails_when_present() {
        let theoretical = stop(Some(noon()), Some(noon()));
        let mut new_stu = StopTimeUpdate {
            stop_point: Id::new("StopR1".to_owned()),
            order: 0,
            arrival: None,
            departure: None,
            arrival_delay: chrono::Duration::zero(),
            departure_delay: chrono::Duration::zero(),
            arrival_status: EventStatus::Delete,
            departure_status: EventStatus::Update,
            message: None,
        };
        assert!(!is_stop_event_served(
            &theoretical,
            &Id::new("StopR1".to_owned()),
            0,
            EventKind::Arrival,
            Some(&new_stu),
            None
        ));
        assert!(is_stop_event_served(
            &theoretical,
            &Id::new("StopR1".to_owned()),
            0,
            EventKind::Departure,
            Some(&new_stu),
            None
        ));
        new_stu.arrival_status = EventStatus::None;
        assert!(is_stop_event_served(
            &theoretical,
            &Id::new("StopR1".to_owned()),
            0,
            EventKind::Arrival,
            Some(&new_stu),
            None
        ));
    }

    #[test]
    fn falls_back_to_db_then_theoretical() {
        let theoretical = stop(Some(noon()), None);
        let contributor: ContributorId = Id::new("c1".to_owned());
        let mut db_tu = TripUpdate::new(
            DatedVjKey::new(
                Id::new("R:vj1".to_owned()),
                chrono::NaiveDate::from_ymd_opt(2012, 6, 15)
                    .unwrap()
                    .and_hms_opt(14, 0, 0)
                    .unwrap(),
            ),
            contributor,
        );
        db_tu.status = TripStatus::Update;
        db_tu.stop_time_updates.push(StopTimeUpdate {
            stop_point: Id::new("StopR1".to_owned()),
            order: 0,
            arrival: None,
            departure: None,
            arrival_delay: chrono::Duration::zero(),
            departure_delay: chrono::Duration::zero(),
            arrival_status: EventStatus::Delete,
            departure_status: EventStatus::None,
            message: None,
        });

        assert!(!is_stop_event_served(
            &theoretical,
            &Id::new("StopR1".to_owned()),
            0,
            EventKind::Arrival,
            None,
            Some(&db_tu)
        ));

        // departure: absent from the theoretical stop, no db opinion either
        assert!(!is_stop_event_served(
            &theoretical,
            &Id::new("StopR2".to_owned()),
            0,
            EventKind::Departure,
            None,
            Some(&db_tu)
        ));

        assert!(!is_stop_event_served(
            &theoretical,
            &Id::new("StopR1".to_owned()),
            0,
            EventKind::Departure,
            None,
            None
        ));
    }
}
