pub use crate::common::RouteResult;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use database::PgDatabase;
use ingestion::config::Config;
use ingestion::database::ScheduleClient;
use model::contributor::ContributorId;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use gtfs_rt::{GtfsRtEncoder, HttpPublisher};

pub mod api;
pub mod common;

/// Everything the inbound HTTP side needs to run a contributor's trip
/// update through the merge core: the persistence handle, the
/// schedule lookup and downstream publish collaborators, and the per-
/// contributor token map used to authorize `POST /api/gtfs_rt/<id>`. Generic
/// over the schedule client for the same reason `gtfs_rt::GtfsRtPoller` is:
/// the real schedule store is out of scope, only a stub ships here.
#[derive(Clone)]
pub struct WebState<S: ScheduleClient + Clone> {
    pub database: PgDatabase,
    pub schedule: S,
    pub publisher: Arc<HttpPublisher>,
    pub encoder: Arc<GtfsRtEncoder>,
    pub contributor_tokens: Arc<HashMap<ContributorId, String>>,
}

impl<S: ScheduleClient + Clone> WebState<S> {
    pub fn new(database: PgDatabase, schedule: S, config: &Config) -> Self {
        Self {
            database,
            schedule,
            publisher: Arc::new(HttpPublisher::new(
                config.broker_url.clone(),
                config.contributor_tokens.clone(),
            )),
            encoder: Arc::new(GtfsRtEncoder),
            contributor_tokens: Arc::new(config.contributor_tokens.clone()),
        }
    }
}

pub async fn start_web_server<S>(state: WebState<S>) -> std::io::Result<()>
where
    S: ScheduleClient + Clone + Send + Sync + 'static,
{
    let routes = Router::new()
        .nest_service("/api", api::routes(state))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind("0.0.0.0:8080").await?;
    axum::serve(listener, routes.into_make_service()).await?;

    Ok(())
}
