//! Where trained models live and how the server gets hold of one.

mod http_store;
mod local_store;
mod provider;

pub use http_store::HttpObjectStore;
pub use local_store::LocalObjectStore;
pub use provider::ModelProvider;

use crate::model::ModelError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("invalid object key {0:?}")]
    InvalidKey(String),

    #[error("object store request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("object store answered with status {0}")]
    Status(u16),

    #[error("object store I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to make a model available for serving.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to fetch model artifact: {0}")]
    Fetch(#[from] StoreError),

    #[error("failed to cache model artifact at {path:?}: {source}")]
    Cache {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to load model artifact: {0}")]
    Load(#[from] ModelError),

    #[error("model loading task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ArtifactError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Fetch(_) => "fetch",
            Self::Cache { .. } => "cache",
            Self::Load(_) => "load",
            Self::Task(_) => "task",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub bucket: String,
    pub key: String,
}

impl ArtifactLocation {
    /// Both values must be set and non-blank.
    pub fn resolve(bucket: Option<&str>, key: Option<&str>) -> Result<Self, ArtifactError> {
        let bucket = non_blank(bucket).ok_or_else(|| {
            ArtifactError::Configuration("model bucket name is not set".to_string())
        })?;
        let key = non_blank(key)
            .ok_or_else(|| ArtifactError::Configuration("model key is not set".to_string()))?;
        Ok(Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }

    /// Last path segment of the key.
    pub fn file_name(&self) -> &str {
        self.key
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or(self.key.as_str())
    }
}

impl std::fmt::Display for ArtifactLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, location: &ArtifactLocation) -> Result<Vec<u8>, StoreError>;

    /// Human readable origin, for logs.
    fn describe(&self) -> String;
}

/// Picks the store implementation from the configured endpoint.
///
/// `http://` and `https://` endpoints are object store URLs; anything else is
/// a local directory, optionally prefixed with `file://`.
pub fn store_from_endpoint(endpoint: &str, timeout: Duration) -> Arc<dyn ObjectStore> {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Arc::new(HttpObjectStore::new(endpoint.to_string(), timeout))
    } else {
        let root = endpoint.strip_prefix("file://").unwrap_or(endpoint);
        Arc::new(LocalObjectStore::new(PathBuf::from(root)))
    }
}
