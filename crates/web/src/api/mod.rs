use axum::{
    response::IntoResponse,
    routing::{get, on},
    Json, Router,
};
use ingestion::database::ScheduleClient;
use serde_json::json;

pub mod gtfs_rt;

use crate::{
    common::{route_not_found, METHOD_FILTER_ALL},
    WebState,
};

macro_rules! resource {
    ($($arg:tt)*) => {
        format!("/api{}", format_args!($($arg)*))
    };
}
pub(crate) use resource;

pub fn routes<S>(state: WebState<S>) -> Router
where
    S: ScheduleClient + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/ping", get(ping))
        .nest_service("/gtfs_rt", gtfs_rt::routes(state))
        .fallback_service(on(METHOD_FILTER_ALL, route_not_found))
}

async fn ping() -> impl IntoResponse {
    Json(json!({
        "message": "pong!"
    }))
}
