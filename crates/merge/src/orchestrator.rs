use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use model::trip::VehicleJourney;
use model::trip_update::{StopTimeUpdate, TripStatus, TripUpdate};

use crate::builder::build_stop_time_update;
use crate::iteration;
use crate::service_test::{is_stop_event_served, EventKind};
use crate::time::combine_with_rollover;

/// Result of one merge: either the trip update changed and should be
/// persisted/linked, or nothing changed and the caller skips linkage. A
/// typed outcome instead of a nullable return, so "rejected" and
/// "unchanged" can never be confused at the call site.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    Changed(TripUpdate),
    Unchanged,
}

/// Merges the theoretical schedule, the previously-stored trip update (if
/// any), and a freshly-received one into a single canonical trip update.
pub fn merge(
    vj: &VehicleJourney,
    db: Option<TripUpdate>,
    new: TripUpdate,
    is_new_complete: bool,
) -> MergeOutcome {
    let mut res = db.clone().unwrap_or_else(|| new.clone());
    res.vj_key = new.vj_key.clone();
    res.contributor = new.contributor.clone();
    res.status = new.status;
    res.effect = new.effect.clone();
    res.message = if new.message.is_some() || is_new_complete {
        new.message.clone()
    } else {
        db.as_ref().and_then(|tu| tu.message.clone())
    };

    if res.status == TripStatus::Delete {
        res.stop_time_updates = Vec::new();
        return MergeOutcome::Changed(res);
    }

    let mut working_date: NaiveDate = vj.utc_circulation_date;
    let mut last_event_time: Option<NaiveTime> = None;
    let mut last_departure: Option<NaiveDateTime> = None;
    let mut has_changes = false;
    let mut result_stus: Vec<StopTimeUpdate> = Vec::new();

    for (order, nav_stop) in iteration::stops(vj, &new, db.as_ref(), is_new_complete) {
        let new_st = new.find(&nav_stop.stop_point, order);
        let db_st = db.as_ref().and_then(|tu| tu.find(&nav_stop.stop_point, order));

        let arrival_served = is_stop_event_served(
            &nav_stop,
            &nav_stop.stop_point,
            order,
            EventKind::Arrival,
            new_st,
            db.as_ref(),
        );
        let base_arrival = combine_served_time(
            arrival_served,
            nav_stop.utc_arrival_time,
            &mut working_date,
            &mut last_event_time,
        );

        let departure_served = is_stop_event_served(
            &nav_stop,
            &nav_stop.stop_point,
            order,
            EventKind::Departure,
            new_st,
            db.as_ref(),
        );
        let base_departure = combine_served_time(
            departure_served,
            nav_stop.utc_departure_time,
            &mut working_date,
            &mut last_event_time,
        );

        let result_stu = match (db.is_some(), new_st) {
            (true, Some(new_st)) => {
                let candidate = build_stop_time_update(
                    base_arrival,
                    base_departure,
                    last_departure,
                    new_st,
                    nav_stop.stop_point.clone(),
                    order,
                );
                let changed = db_st.is_none() || db_st != Some(&candidate);
                has_changes |= changed;
                if has_changes {
                    candidate
                } else {
                    db_st.expect("checked above").clone()
                }
            }
            (false, Some(new_st)) => {
                has_changes = true;
                build_stop_time_update(
                    base_arrival,
                    base_departure,
                    last_departure,
                    new_st,
                    nav_stop.stop_point.clone(),
                    order,
                )
            }
            (true, None) => {
                has_changes |= db_st.is_none();
                match db_st {
                    Some(db_stu) => db_stu.clone(),
                    None => minimal_stop_time_update(
                        nav_stop.stop_point.clone(),
                        order,
                        base_arrival,
                        base_departure,
                    ),
                }
            }
            (false, None) => {
                has_changes = true;
                minimal_stop_time_update(
                    nav_stop.stop_point.clone(),
                    order,
                    base_arrival,
                    base_departure,
                )
            }
        };

        last_departure = result_stu.departure;
        result_stus.push(result_stu);
    }

    if has_changes {
        res.stop_time_updates = result_stus;
        MergeOutcome::Changed(res)
    } else {
        MergeOutcome::Unchanged
    }
}

/// Combines a theoretical time-of-day into an absolute datetime only when
/// the event is served. A served event carrying no time at all resets the
/// rollover tracker to "unknown" rather than leaving the previous reading
/// in place.
fn combine_served_time(
    served: bool,
    time_of_day: Option<NaiveTime>,
    working_date: &mut NaiveDate,
    last_event_time: &mut Option<NaiveTime>,
) -> Option<NaiveDateTime> {
    if !served {
        return None;
    }
    let combined = time_of_day.map(|t| combine_with_rollover(working_date, last_event_time, t));
    if time_of_day.is_none() {
        *last_event_time = None;
    }
    combined
}

fn minimal_stop_time_update(
    stop_point: model::stop::StopPointRef,
    order: usize,
    arrival: Option<NaiveDateTime>,
    departure: Option<NaiveDateTime>,
) -> StopTimeUpdate {
    StopTimeUpdate {
        stop_point,
        order,
        arrival,
        departure,
        arrival_delay: chrono::Duration::zero(),
        departure_delay: chrono::Duration::zero(),
        arrival_status: model::trip_update::EventStatus::None,
        departure_status: model::trip_update::EventStatus::None,
        message: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use model::contributor::ContributorId;
    use model::stop::StopPointRef;
    use model::trip::{TheoreticalStopTime, TripId};
    use model::trip_update::{DatedVjKey, EventStatus};
    use utility::id::Id;

    fn stop_ref(name: &str) -> StopPointRef {
        Id::new(name.to_owned())
    }

    fn trip_id() -> TripId {
        Id::new("R:vj1".to_owned())
    }

    fn contributor() -> ContributorId {
        Id::new("c1".to_owned())
    }

    fn hms(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn four_stop_vj() -> VehicleJourney {
        VehicleJourney::new(
            trip_id(),
            NaiveDate::from_ymd_opt(2012, 6, 15).unwrap(),
            vec![
                TheoreticalStopTime::new(stop_ref("StopR1"), Some(hms(14, 0)), Some(hms(14, 0))),
                TheoreticalStopTime::new(stop_ref("StopR2"), Some(hms(14, 30)), Some(hms(14, 30))),
                TheoreticalStopTime::new(stop_ref("StopR3"), Some(hms(15, 0)), Some(hms(15, 0))),
                TheoreticalStopTime::new(stop_ref("StopR4"), Some(hms(15, 30)), Some(hms(15, 30))),
            ],
        )
    }

    fn new_trip_update(vj_key: DatedVjKey) -> TripUpdate {
        let mut tu = TripUpdate::new(vj_key, contributor());
        tu.status = TripStatus::Update;
        tu
    }

    fn delay_stu(stop: &str, order: usize, delay: Duration) -> StopTimeUpdate {
        StopTimeUpdate {
            stop_point: stop_ref(stop),
            order,
            arrival: None,
            departure: None,
            arrival_delay: delay,
            departure_delay: delay,
            arrival_status: EventStatus::Update,
            departure_status: EventStatus::Update,
            message: None,
        }
    }

    fn dated_key(vj: &VehicleJourney) -> DatedVjKey {
        DatedVjKey::new(
            vj.trip_id.clone(),
            vj.utc_circulation_date.and_hms_opt(14, 0, 0).unwrap(),
        )
    }

    #[test]
    fn simple_delay_partial_update() {
        let vj = four_stop_vj();
        let mut new = new_trip_update(dated_key(&vj));
        new.stop_time_updates
            .push(delay_stu("StopR2", 1, Duration::seconds(60)));
        new.stop_time_updates
            .push(delay_stu("StopR4", 3, Duration::seconds(180)));

        let result = match merge(&vj, None, new, false) {
            MergeOutcome::Changed(tu) => tu,
            MergeOutcome::Unchanged => panic!("expected a change"),
        };

        assert_eq!(result.stop_time_updates.len(), 4);
        let stop2 = &result.stop_time_updates[1];
        assert_eq!(
            stop2.arrival,
            Some(NaiveDate::from_ymd_opt(2012, 6, 15).unwrap().and_hms_opt(14, 31, 0).unwrap())
        );
        assert_eq!(stop2.arrival_delay, Duration::seconds(60));
        let stop4 = &result.stop_time_updates[3];
        assert_eq!(
            stop4.arrival,
            Some(NaiveDate::from_ymd_opt(2012, 6, 15).unwrap().and_hms_opt(15, 33, 0).unwrap())
        );

        let stop1 = &result.stop_time_updates[0];
        assert_eq!(stop1.arrival_status, EventStatus::None);
        assert_eq!(stop1.arrival_delay, Duration::zero());
    }

    #[test]
    fn applying_the_identical_update_twice_does_not_change_the_result() {
        let vj = four_stop_vj();
        let key = dated_key(&vj);

        let mut first_new = new_trip_update(key.clone());
        first_new
            .stop_time_updates
            .push(delay_stu("StopR2", 1, Duration::seconds(60)));

        let first = match merge(&vj, None, first_new, false) {
            MergeOutcome::Changed(tu) => tu,
            MergeOutcome::Unchanged => panic!("expected a change on first merge"),
        };

        let mut second_new = new_trip_update(key);
        second_new
            .stop_time_updates
            .push(delay_stu("StopR2", 1, Duration::seconds(60)));

        let outcome = merge(&vj, Some(first.clone()), second_new, false);
        assert_eq!(outcome, MergeOutcome::Unchanged);
    }

    #[test]
    fn cancellation_clears_all_stop_time_updates() {
        let vj = four_stop_vj();
        let mut new = new_trip_update(dated_key(&vj));
        new.status = TripStatus::Delete;

        let result = match merge(&vj, None, new, false) {
            MergeOutcome::Changed(tu) => tu,
            MergeOutcome::Unchanged => panic!("cancellation must always report a change"),
        };
        assert!(result.stop_time_updates.is_empty());
        assert_eq!(result.status, TripStatus::Delete);
    }

    #[test]
    fn lollipop_route_only_updates_matched_positions() {
        // StopR1, StopR2, StopR3, StopR2 again, StopR4
        let vj = VehicleJourney::new(
            trip_id(),
            NaiveDate::from_ymd_opt(2012, 6, 15).unwrap(),
            vec![
                TheoreticalStopTime::new(stop_ref("StopR1"), Some(hms(14, 0)), Some(hms(14, 0))),
                TheoreticalStopTime::new(stop_ref("StopR2"), Some(hms(14, 30)), Some(hms(14, 30))),
                TheoreticalStopTime::new(stop_ref("StopR3"), Some(hms(15, 0)), Some(hms(15, 0))),
                TheoreticalStopTime::new(stop_ref("StopR2"), Some(hms(15, 15)), Some(hms(15, 15))),
                TheoreticalStopTime::new(stop_ref("StopR4"), Some(hms(15, 30)), Some(hms(15, 30))),
            ],
        );
        let mut new = new_trip_update(dated_key(&vj));
        new.stop_time_updates
            .push(delay_stu("StopR1", 0, Duration::seconds(30)));
        new.stop_time_updates
            .push(delay_stu("StopR2", 1, Duration::seconds(30)));
        new.stop_time_updates
            .push(delay_stu("StopR3", 2, Duration::seconds(30)));

        let result = match merge(&vj, None, new, false) {
            MergeOutcome::Changed(tu) => tu,
            MergeOutcome::Unchanged => panic!("expected a change"),
        };

        assert_eq!(result.stop_time_updates.len(), 5);
        let second_stop_r2 = &result.stop_time_updates[3];
        assert_eq!(second_stop_r2.arrival_status, EventStatus::None);
        assert_eq!(second_stop_r2.arrival_delay, Duration::zero());
    }
}
