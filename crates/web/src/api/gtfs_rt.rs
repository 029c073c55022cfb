use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, State},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{get, on, post},
    Json, Router,
};
use chrono::Utc;
use ingestion::coordinator::{ingest, RawTripUpdate};
use ingestion::database::ScheduleClient;
use model::trip_update::RealTimeUpdate;
use serde::Serialize;
use serde_json::json;
use utility::id::Id;

use crate::{
    common::{route_not_found, RouteErrorResponse, RouteResult, METHOD_FILTER_ALL},
    WebState,
};

pub(crate) fn routes<S>(state: WebState<S>) -> Router
where
    S: ScheduleClient + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(list_contributors))
        .route("/:contributor_id", post(ingest_feed))
        .with_state(state)
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestResponse {
    message: String,
    persisted: usize,
    rejected: usize,
    published: bool,
}

/// `POST /api/gtfs_rt/<contributor_id>`: an unknown contributor is rejected
/// before the body is even decoded, an undecodable body is a 400, everything
/// else runs through the same [`ingest`] path the poller uses.
async fn ingest_feed<S>(
    OriginalUri(original_uri): OriginalUri,
    State(state): State<WebState<S>>,
    Path(contributor_id): Path<String>,
    body: Bytes,
) -> RouteResult<Json<IngestResponse>>
where
    S: ScheduleClient + Clone + Send + Sync + 'static,
{
    let contributor = Id::new(contributor_id);
    if !state.contributor_tokens.contains_key(&contributor) {
        return Err(RouteErrorResponse::new(StatusCode::NOT_FOUND)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
            .with_message(format!("contributor '{}' not found", contributor.raw())));
    }

    let decoded = gtfs_rt::decode_feed(&body).map_err(|why| {
        RouteErrorResponse::new(StatusCode::BAD_REQUEST)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
            .with_message("invalid gtfs-rt protobuf")
            .with_detailed_information(format!("{:?}", why))
    })?;

    let mut raw_trip_updates = Vec::with_capacity(decoded.len());
    for decoded_tu in decoded {
        match state
            .schedule
            .get_vehicle_journey(&decoded_tu.trip_id, decoded_tu.start_date)
            .await
        {
            Ok(vj) => {
                let trip_update = gtfs_rt::to_trip_update(decoded_tu, &vj, &contributor);
                raw_trip_updates.push(RawTripUpdate { vj, trip_update });
            }
            Err(why) => {
                log::warn!(
                    "dropping trip update for unknown trip {:?}: {:?}",
                    decoded_tu.trip_id,
                    why
                );
            }
        }
    }

    let rtu = RealTimeUpdate::new(body.to_vec(), "gtfs-rt".to_owned(), contributor, Utc::now());

    let outcome = ingest(
        &state.database,
        state.publisher.as_ref(),
        state.encoder.as_ref(),
        rtu,
        raw_trip_updates,
        false,
    )
    .await
    .map_err(|why| {
        RouteErrorResponse::new(StatusCode::INTERNAL_SERVER_ERROR)
            .with_method(&Method::POST)
            .with_uri(original_uri.path())
            .with_message("could not process gtfs-rt feed")
            .with_detailed_information(format!("{:?}", why))
    })?;

    Ok(Json(IngestResponse {
        message: "GTFS-RT feed processed".to_owned(),
        persisted: outcome.persisted,
        rejected: outcome.rejected,
        published: outcome.published,
    }))
}

/// `GET /api/gtfs_rt`, mirroring `GtfsRT.get`: lists the configured
/// contributors rather than any single contributor's merged feed.
async fn list_contributors<S>(State(state): State<WebState<S>>) -> impl IntoResponse
where
    S: ScheduleClient + Clone + Send + Sync + 'static,
{
    let ids: Vec<String> = state.contributor_tokens.keys().map(|id| id.raw()).collect();
    Json(json!({ "gtfs-rt": ids }))
}
