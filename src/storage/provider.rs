use super::{ArtifactError, ArtifactLocation, ObjectStore};
use crate::model::ModelArtifact;
use crate::server::metrics;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// Loads the model on first use and hands out the same instance afterwards.
///
/// Concurrent first callers share one load. A failed load leaves the cell
/// empty, so the next caller tries again.
pub struct ModelProvider {
    store: Arc<dyn ObjectStore>,
    bucket: Option<String>,
    key: Option<String>,
    cache_dir: PathBuf,
    model: OnceCell<Arc<ModelArtifact>>,
}

impl ModelProvider {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        bucket: Option<String>,
        key: Option<String>,
        cache_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            bucket,
            key,
            cache_dir,
            model: OnceCell::new(),
        }
    }

    /// Serves a model that is already in memory.
    pub fn preloaded(model: ModelArtifact) -> Self {
        Self {
            store: Arc::new(super::LocalObjectStore::new(PathBuf::new())),
            bucket: None,
            key: None,
            cache_dir: PathBuf::new(),
            model: OnceCell::new_with(Some(Arc::new(model))),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    pub async fn get(&self) -> Result<Arc<ModelArtifact>, ArtifactError> {
        self.model
            .get_or_try_init(|| self.load())
            .await
            .map(Arc::clone)
    }

    async fn load(&self) -> Result<Arc<ModelArtifact>, ArtifactError> {
        let start = Instant::now();
        let result = self.fetch_and_decode().await;
        let outcome = match &result {
            Ok(model) => {
                info!(
                    "Model loaded in {:?}: target {}, {} training rows, trained at {}",
                    start.elapsed(),
                    model.target,
                    model.training_rows,
                    model.trained_at
                );
                "success"
            }
            Err(e) => {
                error!("Model could not be loaded: {}", e);
                e.kind()
            }
        };
        metrics::record_model_load(outcome, start.elapsed());
        result
    }

    async fn fetch_and_decode(&self) -> Result<Arc<ModelArtifact>, ArtifactError> {
        let location = ArtifactLocation::resolve(self.bucket.as_deref(), self.key.as_deref())?;
        info!(
            "Fetching model {} from {}",
            location,
            self.store.describe()
        );
        let bytes = self.store.get_object(&location).await?;

        let path = self.cache_dir.join(location.file_name());
        let cache_error = |source| ArtifactError::Cache {
            path: path.clone(),
            source,
        };
        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(cache_error)?;
        tokio::fs::write(&path, &bytes).await.map_err(cache_error)?;

        let model = tokio::task::spawn_blocking(move || ModelArtifact::load(&path))
            .await??;
        Ok(Arc::new(model))
    }
}
