use std::collections::HashMap;

use async_trait::async_trait;

use ingestion::database::{PublishError, Publisher};
use model::contributor::ContributorId;

/// Sends an encoded feed downstream over HTTP, one POST per contributor,
/// using the same header-based auth pattern as the other HTTP clients in
/// this workspace.
pub struct HttpPublisher {
    http: reqwest::Client,
    broker_url: String,
    contributor_tokens: HashMap<ContributorId, String>,
}

impl HttpPublisher {
    pub fn new(broker_url: String, contributor_tokens: HashMap<ContributorId, String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            broker_url,
            contributor_tokens,
        }
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(
        &self,
        feed: Vec<u8>,
        contributor: &ContributorId,
    ) -> Result<(), PublishError> {
        let url = format!("{}/{}", self.broker_url, contributor.raw());
        let mut request = self.http.post(&url).body(feed);
        if let Some(token) = self.contributor_tokens.get(contributor) {
            request = request.header("authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|why| PublishError::Unreachable(Box::new(why)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(PublishError::Rejected(format!(
                "downstream broker returned {}",
                response.status()
            )))
        }
    }
}
