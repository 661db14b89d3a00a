use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Model location (can override CLI)
    pub bucket_name: Option<String>,
    pub model_key: Option<String>,
    pub model_store_endpoint: Option<String>,
    pub model_cache_dir: Option<String>,
    pub store_timeout_sec: Option<u64>,
    pub preload_model: Option<bool>,

    // Server
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub max_body_bytes: Option<usize>,

    pub training: Option<TrainingConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct TrainingConfig {
    pub data_path: Option<String>,
    pub output_path: Option<String>,
    pub target: Option<String>,
    pub test_ratio: Option<f64>,
    pub seed: Option<u64>,
    pub iterations: Option<usize>,
    pub max_depth: Option<u32>,
    pub shrinkage: Option<f32>,
    pub min_leaf_size: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
