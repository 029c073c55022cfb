use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contributor::ContributorId;
use crate::stop::StopPointRef;
use crate::trip::TripId;
use utility::serde::duration;

/// Status of a stop event (arrival or departure) within a `StopTimeUpdate`.
/// Five statuses are tracked per event, plus `AddedForDetour` for stops
/// inserted mid-detour.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// No real-time information for this event; fall back to theory.
    None,
    Update,
    Delete,
    DeletedForDetour,
    Add,
    AddedForDetour,
}

impl EventStatus {
    pub fn is_added(self) -> bool {
        matches!(self, EventStatus::Add | EventStatus::AddedForDetour)
    }

    pub fn is_deleted(self) -> bool {
        matches!(self, EventStatus::Delete | EventStatus::DeletedForDetour)
    }
}

/// Status of an entire trip.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    None,
    Update,
    Delete,
    Add,
}

/// Composite key identifying one dated vehicle journey: the theoretical trip
/// plus the calendar day it runs on, expressed as the UTC timestamp of that
/// trip's first theoretical departure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatedVjKey {
    pub trip_id: TripId,
    pub utc_start_timestamp: NaiveDateTime,
}

impl DatedVjKey {
    pub fn new(trip_id: TripId, utc_start_timestamp: NaiveDateTime) -> Self {
        Self {
            trip_id,
            utc_start_timestamp,
        }
    }
}

/// One real-time arrival/departure pair for a single stop in a trip
/// `order` is the stop's position in the trip, disambiguating
/// lollipop routes that revisit a stop point.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopTimeUpdate {
    pub stop_point: StopPointRef,
    pub order: usize,

    /// Naive UTC (no timezone attached), per the storage layer's convention
    /// of keeping all trip-update datetimes tz-less.
    pub arrival: Option<NaiveDateTime>,
    pub departure: Option<NaiveDateTime>,

    #[serde(with = "duration")]
    pub arrival_delay: Duration,
    #[serde(with = "duration")]
    pub departure_delay: Duration,

    pub arrival_status: EventStatus,
    pub departure_status: EventStatus,

    pub message: Option<String>,
}

/// The canonical, merged real-time picture of one dated vehicle journey
/// Produced by the merge engine, consumed by persistence and
/// by the outbound GTFS-RT feed.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripUpdate {
    pub vj_key: DatedVjKey,
    pub status: TripStatus,
    pub effect: Option<String>,
    pub message: Option<String>,
    pub contributor: ContributorId,
    pub stop_time_updates: Vec<StopTimeUpdate>,
}

impl TripUpdate {
    pub fn new(vj_key: DatedVjKey, contributor: ContributorId) -> Self {
        Self {
            vj_key,
            status: TripStatus::None,
            effect: None,
            message: None,
            contributor,
            stop_time_updates: Vec::new(),
        }
    }

    /// Matches the `find_st_in_vj`-equivalent lookup on a real-time trip:
    /// both `order` and `stop_point` must agree, so a lollipop route
    /// revisiting a stop is disambiguated by position.
    pub fn find(&self, stop_point: &StopPointRef, order: usize) -> Option<&StopTimeUpdate> {
        self.stop_time_updates
            .iter()
            .find(|stu| stu.order == order && &stu.stop_point == stop_point)
    }

    pub fn find_mut(
        &mut self,
        stop_point: &StopPointRef,
        order: usize,
    ) -> Option<&mut StopTimeUpdate> {
        self.stop_time_updates
            .iter_mut()
            .find(|stu| stu.order == order && &stu.stop_point == stop_point)
    }

    /// True iff a previous real-time update already added `stop_point` to
    /// this trip, meaning a later RTU is allowed to remove it again
    /// without being rejected as a no-op removal.
    pub fn deleteable(&self, stop_point: &StopPointRef) -> bool {
        self.stop_time_updates
            .iter()
            .any(|stu| &stu.stop_point == stop_point && (stu.arrival_status.is_added() || stu.departure_status.is_added()))
    }
}

/// One raw ingestion event: the feed bytes a contributor sent, plus which
/// dated vehicle journeys it ended up touching once merged.
/// `linked_trip_updates` stores keys rather than the `TripUpdate`s
/// themselves; the persistence layer resolves keys to rows, which avoids
/// needing shared ownership between an RTU and the many TUs it can affect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealTimeUpdate {
    pub raw: Vec<u8>,
    pub connector: String,
    pub contributor: ContributorId,
    pub received_at: DateTime<Utc>,
    pub linked_trip_updates: Vec<DatedVjKey>,
}

impl RealTimeUpdate {
    pub fn new(
        raw: Vec<u8>,
        connector: String,
        contributor: ContributorId,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            raw,
            connector,
            contributor,
            received_at,
            linked_trip_updates: Vec::new(),
        }
    }
}
