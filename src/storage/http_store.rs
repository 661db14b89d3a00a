use super::{ArtifactLocation, ObjectStore, StoreError};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Object store reachable over HTTP with path-style addressing,
/// `{endpoint}/{bucket}/{key}`.
pub struct HttpObjectStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpObjectStore {
    pub fn new(endpoint: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();

        let endpoint = endpoint.trim_end_matches('/').to_string();

        Self { client, endpoint }
    }

    pub fn object_url(&self, location: &ArtifactLocation) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            location.bucket,
            location.key.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn get_object(&self, location: &ArtifactLocation) -> Result<Vec<u8>, StoreError> {
        let url = self.object_url(location);
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            status if status.is_success() => Ok(response.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
            }),
            status => Err(StoreError::Status(status.as_u16())),
        }
    }

    fn describe(&self) -> String {
        self.endpoint.clone()
    }
}
