use std::collections::HashMap;
use std::time::Duration;

use model::contributor::ContributorId;
use utility::id::Id;

const DEFAULT_QUERY_CACHE_TTL_SECS: u64 = 600;
const DEFAULT_PUBLISH_DATE_CACHE_TTL_SECS: u64 = 600;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;
const DEFAULT_POLLING_TIMEOUT_SECS: u64 = 1;
const DEFAULT_POLLING_INTERVAL_SECS: u64 = 30;

/// Ingestion-wide configuration, loaded the way `DatabaseConnectionInfo::from_env`
/// loads its settings elsewhere in this workspace: plain `std::env::var`
/// reads with `expect`/`Option` chains, no config-parsing crate.
#[derive(Debug, Clone)]
pub struct Config {
    pub broker_url: String,
    pub contributor_tokens: HashMap<ContributorId, String>,
    pub contributor_feeds: HashMap<ContributorId, String>,
    pub query_cache_ttl: Duration,
    pub publish_date_cache_ttl: Duration,
    pub http_timeout: Duration,
    pub polling_http_timeout: Duration,
    pub polling_interval: Duration,
    pub polling_lock_ttl: Duration,
    pub task_max_retry_delay: Duration,
    pub task_wait_fixed: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            broker_url: std::env::var("INGESTION_BROKER_URL")
                .expect("INGESTION_BROKER_URL must be set"),
            contributor_tokens: parse_pairs(
                std::env::var("INGESTION_CONTRIBUTOR_TOKENS").unwrap_or_default(),
            ),
            contributor_feeds: parse_pairs(
                std::env::var("INGESTION_CONTRIBUTOR_FEEDS").unwrap_or_default(),
            ),
            query_cache_ttl: env_secs("INGESTION_QUERY_CACHE_TTL", DEFAULT_QUERY_CACHE_TTL_SECS),
            publish_date_cache_ttl: env_secs(
                "INGESTION_PUBLISH_DATE_CACHE_TTL",
                DEFAULT_PUBLISH_DATE_CACHE_TTL_SECS,
            ),
            http_timeout: env_secs("INGESTION_HTTP_TIMEOUT", DEFAULT_HTTP_TIMEOUT_SECS),
            polling_http_timeout: env_secs(
                "INGESTION_POLLING_HTTP_TIMEOUT",
                DEFAULT_POLLING_TIMEOUT_SECS,
            ),
            polling_interval: env_secs(
                "INGESTION_POLLING_INTERVAL",
                DEFAULT_POLLING_INTERVAL_SECS,
            ),
            polling_lock_ttl: env_secs(
                "INGESTION_POLLING_LOCK_TTL",
                DEFAULT_HTTP_TIMEOUT_SECS,
            ),
            task_max_retry_delay: env_secs("INGESTION_TASK_MAX_RETRY_DELAY", 300),
            task_wait_fixed: env_secs("INGESTION_TASK_WAIT_FIXED", 2),
        }
    }
}

/// Parses `contributor_id=value,contributor_id=value` into a lookup map.
/// Used for both the per-contributor token map and the per-contributor feed
/// URL map, which share this shape.
fn parse_pairs(raw: String) -> HashMap<ContributorId, String> {
    raw.split(',')
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| entry.split_once('='))
        .map(|(id, value)| (Id::new(id.to_owned()), value.to_owned()))
        .collect()
}

fn env_secs(name: &str, default: u64) -> Duration {
    let secs = std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_contributor_tokens() {
        let tokens = parse_pairs("a=tok-a,b=tok-b".to_owned());
        assert_eq!(tokens.get(&Id::new("a".to_owned())), Some(&"tok-a".to_owned()));
        assert_eq!(tokens.get(&Id::new("b".to_owned())), Some(&"tok-b".to_owned()));
    }

    #[test]
    fn empty_token_string_yields_an_empty_map() {
        assert!(parse_pairs(String::new()).is_empty());
    }
}
