use chrono::NaiveDateTime;
use sqlx::prelude::FromRow;
use sqlx::types::Json;

use model::contributor::ContributorId;
use model::trip::TripId;
use model::trip_update::{DatedVjKey, StopTimeUpdate, TripStatus, TripUpdate};

#[derive(Debug, Clone, sqlx::Type)]
#[sqlx(type_name = "trip_status", rename_all = "snake_case")]
pub enum TripStatusColumn {
    None,
    Update,
    Delete,
    Add,
}

impl From<TripStatus> for TripStatusColumn {
    fn from(value: TripStatus) -> Self {
        match value {
            TripStatus::None => Self::None,
            TripStatus::Update => Self::Update,
            TripStatus::Delete => Self::Delete,
            TripStatus::Add => Self::Add,
        }
    }
}

impl From<TripStatusColumn> for TripStatus {
    fn from(value: TripStatusColumn) -> Self {
        match value {
            TripStatusColumn::None => Self::None,
            TripStatusColumn::Update => Self::Update,
            TripStatusColumn::Delete => Self::Delete,
            TripStatusColumn::Add => Self::Add,
        }
    }
}

/// Stored shape of one row in `trip_updates`, keyed by the same
/// `(trip_id, utc_start_timestamp)` pair the merge engine uses as a
/// `DatedVjKey` — no surrogate id, the key *is* the identity.
#[derive(Debug, Clone, FromRow)]
pub struct TripUpdateRow {
    pub trip_id: String,
    pub utc_start_timestamp: NaiveDateTime,
    pub status: TripStatusColumn,
    pub effect: Option<String>,
    pub message: Option<String>,
    pub contributor: String,
    pub stop_time_updates: Json<Vec<StopTimeUpdate>>,
}

impl TripUpdateRow {
    pub fn from_model(tu: &TripUpdate) -> Self {
        Self {
            trip_id: tu.vj_key.trip_id.raw(),
            utc_start_timestamp: tu.vj_key.utc_start_timestamp,
            status: tu.status.into(),
            effect: tu.effect.clone(),
            message: tu.message.clone(),
            contributor: tu.contributor.raw(),
            stop_time_updates: Json(tu.stop_time_updates.clone()),
        }
    }

    pub fn into_model(self) -> TripUpdate {
        TripUpdate {
            vj_key: DatedVjKey::new(
                TripId::new(self.trip_id),
                self.utc_start_timestamp,
            ),
            status: self.status.into(),
            effect: self.effect,
            message: self.message,
            contributor: ContributorId::new(self.contributor),
            stop_time_updates: self.stop_time_updates.0,
        }
    }
}
