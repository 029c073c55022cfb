use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use model::trip::{TripId, VehicleJourney};

use crate::database::{ScheduleClient, ScheduleLookupError};

/// In-memory `ScheduleClient` for tests: the real schedule store is out of
/// scope, so this is the only implementation this repo ships.
#[derive(Default, Clone)]
pub struct StaticScheduleClient {
    journeys: HashMap<(TripId, NaiveDate), VehicleJourney>,
}

impl StaticScheduleClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vehicle_journey(mut self, date: NaiveDate, vj: VehicleJourney) -> Self {
        self.journeys.insert((vj.trip_id.clone(), date), vj);
        self
    }
}

#[async_trait]
impl ScheduleClient for StaticScheduleClient {
    async fn get_vehicle_journey(
        &self,
        trip_id: &TripId,
        date: NaiveDate,
    ) -> Result<VehicleJourney, ScheduleLookupError> {
        self.journeys
            .get(&(trip_id.clone(), date))
            .cloned()
            .ok_or(ScheduleLookupError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use model::trip::TheoreticalStopTime;
    use utility::id::Id;

    #[tokio::test]
    async fn returns_not_found_for_an_unknown_trip() {
        let client = StaticScheduleClient::new();
        let err = client
            .get_vehicle_journey(&Id::new("R:vj1".to_owned()), NaiveDate::from_ymd_opt(2012, 6, 15).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ScheduleLookupError::NotFound));
    }

    #[tokio::test]
    async fn returns_a_registered_vehicle_journey() {
        let date = NaiveDate::from_ymd_opt(2012, 6, 15).unwrap();
        let vj = VehicleJourney::new(
            Id::new("R:vj1".to_owned()),
            date,
            vec![TheoreticalStopTime::new(
                Id::new("StopR1".to_owned()),
                Some(NaiveTime::from_hms_opt(14, 0, 0).unwrap()),
                None,
            )],
        );
        let client = StaticScheduleClient::new().with_vehicle_journey(date, vj);
        let found = client
            .get_vehicle_journey(&Id::new("R:vj1".to_owned()), date)
            .await
            .unwrap();
        assert_eq!(found.stop_times.len(), 1);
    }
}
