use chrono::{Duration, NaiveDateTime};
use model::stop::StopPointRef;
use model::trip_update::{EventStatus, StopTimeUpdate};

/// Per-event `(time, status, delay)` derived from a base schedule time and
/// an incoming status/delay pair.
fn update_info(
    base_time: Option<NaiveDateTime>,
    status: EventStatus,
    delay: Duration,
) -> (Option<NaiveDateTime>, EventStatus, Duration) {
    match status {
        EventStatus::Update => (base_time.map(|t| t + delay), status, delay),
        EventStatus::Delete | EventStatus::DeletedForDetour => (None, status, Duration::zero()),
        EventStatus::Add | EventStatus::AddedForDetour => (base_time, status, Duration::zero()),
        EventStatus::None => (base_time, EventStatus::None, Duration::zero()),
    }
}

/// Builds one result `StopTimeUpdate` from the theoretical base times, the
/// previous stop's result departure, and the incoming STU.
pub fn build_stop_time_update(
    base_arrival: Option<NaiveDateTime>,
    base_departure: Option<NaiveDateTime>,
    last_departure: Option<NaiveDateTime>,
    new: &StopTimeUpdate,
    stop_point: StopPointRef,
    order: usize,
) -> StopTimeUpdate {
    let (mut departure, departure_status, mut departure_delay) =
        update_info(base_departure, new.departure_status, new.departure_delay);
    let (mut arrival, arrival_status, mut arrival_delay) =
        update_info(base_arrival, new.arrival_status, new.arrival_delay);

    // close gaps: an absent side borrows from whichever of the pair (or the
    // previous stop's departure) is available.
    if arrival.is_none() {
        arrival = departure.or(last_departure);
    }
    if departure.is_none() {
        departure = arrival;
    }

    if let (Some(last), Some(arr)) = (last_departure, arrival) {
        if last > arr {
            let gap = last - arr;
            arrival_delay += gap;
            arrival = Some(last);
        }
    }

    if let (Some(arr), Some(dep)) = (arrival, departure) {
        if arr > dep {
            let gap = arr - dep;
            departure_delay += gap;
            departure = Some(arr);
        }
    }

    StopTimeUpdate {
        stop_point,
        order,
        arrival,
        departure,
        arrival_delay,
        departure_delay,
        arrival_status,
        departure_status,
        message: new.message.clone(),
    }
}
