use super::{ArtifactLocation, ObjectStore, StoreError};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Directory laid out as `{root}/{bucket}/{key}`.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn object_path(&self, location: &ArtifactLocation) -> Result<PathBuf, StoreError> {
        let mut path = self.root.clone();
        for part in [location.bucket.as_str(), location.key.as_str()] {
            let relative = Path::new(part.trim_start_matches('/'));
            if relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
            {
                return Err(StoreError::InvalidKey(part.to_string()));
            }
            path.push(relative);
        }
        Ok(path)
    }

    /// Stores `bytes` under the location, creating directories as needed.
    pub async fn put_object(
        &self,
        location: &ArtifactLocation,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        let path = self.object_path(location)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get_object(&self, location: &ArtifactLocation) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(location)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound {
                bucket: location.bucket.clone(),
                key: location.key.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
