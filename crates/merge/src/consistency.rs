use chrono::{Duration, NaiveDateTime};

use model::trip_update::TripUpdate;

/// A trip update whose stop-time order doesn't match its position, or whose
/// first stop has no derivable arrival time.
#[derive(Debug, Clone, PartialEq)]
pub enum MalformedTrip {
    OrderMismatch { index: usize, stu_order: usize },
    MissingFirstArrival,
}

/// Walks a merged trip update's stop-time updates and fills in / pushes
/// forward delays so the result is physically plausible. Rejects the whole
/// trip update if stop-time order doesn't match position.
pub fn enforce(mut tu: TripUpdate) -> Result<TripUpdate, MalformedTrip> {
    let mut previous: Option<(NaiveDateTime, Duration)> = None;

    for (index, stu) in tu.stop_time_updates.iter_mut().enumerate() {
        if stu.order != index {
            return Err(MalformedTrip::OrderMismatch {
                index,
                stu_order: stu.order,
            });
        }

        if stu.arrival.is_none() {
            stu.arrival = stu.departure;
            if stu.arrival.is_none() {
                stu.arrival = previous.map(|(time, _)| time);
            }
            if stu.arrival.is_none() {
                return Err(MalformedTrip::MissingFirstArrival);
            }
            if stu.arrival_delay.is_zero() && !stu.departure_delay.is_zero() {
                stu.arrival_delay = stu.departure_delay;
            }
        }

        if stu.departure.is_none() {
            stu.departure = stu.arrival;
            if stu.departure_delay.is_zero() && !stu.arrival_delay.is_zero() {
                stu.departure_delay = stu.arrival_delay;
            }
        }

        if !stu.arrival_status.is_deleted() {
            let arrival = stu.arrival.expect("filled in above");
            if let Some((previous_time, previous_delay)) = previous {
                if previous_time > arrival {
                    let gap = previous_delay - stu.arrival_delay;
                    stu.arrival_delay += gap;
                    stu.arrival = Some(arrival + gap);
                }
            }
            previous = Some((stu.arrival.expect("set above"), stu.arrival_delay));
        }

        if !stu.departure_status.is_deleted() {
            let departure = stu.departure.expect("filled in above");
            if let Some((previous_time, previous_delay)) = previous {
                if previous_time > departure {
                    let gap = previous_delay - stu.departure_delay;
                    stu.departure_delay += gap;
                    stu.departure = Some(departure + gap);
                }
            }
            previous = Some((stu.departure.expect("set above"), stu.departure_delay));
        }
    }

    Ok(tu)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use model::contributor::ContributorId;
    use model::stop::StopPointRef;
    use model::trip::TripId;
    use model::trip_update::{DatedVjKey, EventStatus, StopTimeUpdate, TripStatus};
    use utility::id::Id;

    fn stop_ref(name: &str) -> StopPointRef {
        Id::new(name.to_owned())
    }

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2012, 6, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn contributor() -> ContributorId {
        Id::new("c1".to_owned())
    }

    fn base_tu() -> TripUpdate {
        let mut tu = TripUpdate::new(
            DatedVjKey::new(Id::new("R:vj1".to_owned()), dt(14, 0)),
            contributor(),
        );
        tu.status = TripStatus::Update;
        tu
    }

    fn stu(order: usize, arrival: Option<NaiveDateTime>, delay: Duration) -> StopTimeUpdate {
        StopTimeUpdate {
            stop_point: stop_ref(&format!("Stop{}", order)),
            order,
            arrival,
            departure: arrival,
            arrival_delay: delay,
            departure_delay: delay,
            arrival_status: EventStatus::Update,
            departure_status: EventStatus::Update,
            message: None,
        }
    }

    #[test]
    fn rejects_a_trip_with_non_contiguous_order() {
        let mut tu = base_tu();
        tu.stop_time_updates.push(stu(0, Some(dt(14, 0)), Duration::zero()));
        let mut bad = stu(0, Some(dt(14, 30)), Duration::zero());
        bad.order = 5;
        tu.stop_time_updates.push(bad);

        let err = enforce(tu).unwrap_err();
        assert_eq!(
            err,
            MalformedTrip::OrderMismatch {
                index: 1,
                stu_order: 5
            }
        );
    }

    #[test]
    fn pushes_delay_forward_when_an_earlier_stop_is_unannounced() {
        let mut tu = base_tu();
        tu.stop_time_updates
            .push(stu(0, Some(dt(14, 0)), Duration::zero()));
        // second stop arrives "later" than it should given stop 0's pushed delay
        let mut late = stu(1, Some(dt(14, 25)), Duration::zero());
        // simulate stop 0 having actually been delayed past stop 1's theoretical time
        tu.stop_time_updates[0].arrival = Some(dt(14, 30));
        tu.stop_time_updates[0].arrival_delay = Duration::minutes(30);
        tu.stop_time_updates[0].departure = Some(dt(14, 30));
        tu.stop_time_updates[0].departure_delay = Duration::minutes(30);
        late.departure = Some(dt(14, 25));
        tu.stop_time_updates.push(late);

        let result = enforce(tu).unwrap();
        let second = &result.stop_time_updates[1];
        assert_eq!(second.arrival, Some(dt(14, 30)));
        assert_eq!(second.arrival_delay, Duration::minutes(5));
    }

    #[test]
    fn fills_in_a_missing_arrival_from_departure() {
        let mut tu = base_tu();
        let mut only_departure = stu(0, None, Duration::zero());
        only_departure.departure = Some(dt(14, 0));
        only_departure.arrival = None;
        tu.stop_time_updates.push(only_departure);

        let result = enforce(tu).unwrap();
        assert_eq!(result.stop_time_updates[0].arrival, Some(dt(14, 0)));
    }

    #[test]
    fn rejects_when_first_stop_has_no_derivable_arrival() {
        let mut tu = base_tu();
        let mut empty = stu(0, None, Duration::zero());
        empty.departure = None;
        tu.stop_time_updates.push(empty);

        let err = enforce(tu).unwrap_err();
        assert_eq!(err, MalformedTrip::MissingFirstArrival);
    }
}
