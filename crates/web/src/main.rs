use database::{DatabaseConnectionInfo, PgDatabase, PgDistributedLock};
use ingestion::config::Config;
use ingestion::testing::StaticScheduleClient;
use web::{start_web_server, WebState};

#[tokio::main]
async fn main() {
    env_logger::init();

    // database
    let database_connection_info = DatabaseConnectionInfo::from_env()
        .expect("expected database connection info in env.");
    let database = PgDatabase::connect(database_connection_info)
        .await
        .expect("could not connect to database.");

    // ingestion config, shared between the web ingress and every poller
    let config = Config::from_env();
    let lock = PgDistributedLock::new(database.pool());

    // one polling task per configured contributor; the real schedule store
    // is out of scope, so every poller shares the same empty stub and only
    // ever processes trip updates for trips it's told about via the
    // inbound HTTP route instead.
    for (contributor, feed_url) in config.contributor_feeds.clone() {
        let database = database.clone();
        let publisher = gtfs_rt::HttpPublisher::new(
            config.broker_url.clone(),
            config.contributor_tokens.clone(),
        );
        let poller = gtfs_rt::GtfsRtPoller::new(
            contributor,
            feed_url,
            config.polling_http_timeout,
            config.polling_interval,
            StaticScheduleClient::new(),
            database,
            publisher,
            gtfs_rt::GtfsRtEncoder,
            lock.clone(),
        );
        tokio::spawn(ingestion::poller::run(poller));
    }

    // web server
    let state = WebState::new(database, StaticScheduleClient::new(), &config);
    let _ = start_web_server(state).await;
}
