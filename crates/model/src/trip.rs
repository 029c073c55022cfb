use chrono::{NaiveDate, NaiveTime};
use utility::id::HasId;

use crate::stop::StopPointRef;
use crate::trip_update::DatedVjKey;

/// Marker type for the theoretical vehicle journey, identified by the stable
/// trip id the schedule-lookup collaborator hands back.
pub struct VehicleJourneyMarker;

impl HasId for VehicleJourneyMarker {
    type IdType = String;
}

pub type TripId = utility::id::Id<VehicleJourneyMarker>;

/// One scheduled run of a trip on a specific calendar day.
/// Immutable within the scope of one merge.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleJourney {
    pub trip_id: TripId,
    pub utc_circulation_date: NaiveDate,
    pub stop_times: Vec<TheoreticalStopTime>,
}

impl VehicleJourney {
    pub fn new(
        trip_id: TripId,
        utc_circulation_date: NaiveDate,
        stop_times: Vec<TheoreticalStopTime>,
    ) -> Self {
        Self {
            trip_id,
            utc_circulation_date,
            stop_times,
        }
    }

    /// Theoretical stop matching `stop_point`, the `find_st_in_vj` lookup.
    pub fn find_stop(&self, stop_point: &StopPointRef) -> Option<&TheoreticalStopTime> {
        self.stop_times
            .iter()
            .find(|stop| &stop.stop_point == stop_point)
    }

    /// The dated VJ key a trip update produced against this journey must
    /// carry: `start_timestamp` is the UTC timestamp of the first
    /// theoretical departure, falling back to the first arrival, or to
    /// midnight if the journey has no stop times at all.
    pub fn dated_key(&self) -> DatedVjKey {
        let first = self.stop_times.first();
        let clock = first
            .and_then(|st| st.utc_departure_time.or(st.utc_arrival_time))
            .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).unwrap());
        DatedVjKey::new(self.trip_id.clone(), self.utc_circulation_date.and_time(clock))
    }
}

/// One theoretical stop-time pair in a vehicle journey. Either side may be
/// absent for an origin or terminus.
#[derive(Debug, Clone, PartialEq)]
pub struct TheoreticalStopTime {
    pub stop_point: StopPointRef,
    pub utc_arrival_time: Option<NaiveTime>,
    pub utc_departure_time: Option<NaiveTime>,
}

impl TheoreticalStopTime {
    pub fn new(
        stop_point: StopPointRef,
        utc_arrival_time: Option<NaiveTime>,
        utc_departure_time: Option<NaiveTime>,
    ) -> Self {
        Self {
            stop_point,
            utc_arrival_time,
            utc_departure_time,
        }
    }
}
