mod file_config;

pub use file_config::{FileConfig, TrainingConfig};

use crate::features::VIEW_COUNT;
use crate::model::BoosterParams;
use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_DATA_PATH: &str = "data/youtube_data.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "artifacts/youtube_popularity_model.json";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub bucket_name: Option<String>,
    pub model_key: Option<String>,
    pub model_store_endpoint: String,
    pub model_cache_dir: PathBuf,
    pub store_timeout_sec: u64,
    pub preload_model: bool,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub max_body_bytes: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            bucket_name: None,
            model_key: None,
            model_store_endpoint: "https://s3.amazonaws.com".to_string(),
            model_cache_dir: std::env::temp_dir(),
            store_timeout_sec: 30,
            preload_model: true,
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::Path,
            max_body_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Unset values are reported when the model is first loaded, not here.
    pub bucket_name: Option<String>,
    pub model_key: Option<String>,
    pub model_store_endpoint: String,
    pub model_cache_dir: PathBuf,
    pub store_timeout_sec: u64,
    pub preload_model: bool,

    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub max_body_bytes: usize,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let bucket_name = file.bucket_name.or_else(|| cli.bucket_name.clone());
        let model_key = file.model_key.or_else(|| cli.model_key.clone());
        let model_store_endpoint = file
            .model_store_endpoint
            .unwrap_or_else(|| cli.model_store_endpoint.clone());
        if model_store_endpoint.trim().is_empty() {
            bail!("model_store_endpoint must not be empty");
        }

        let model_cache_dir = file
            .model_cache_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| cli.model_cache_dir.clone());
        if model_cache_dir.exists() && !model_cache_dir.is_dir() {
            bail!("model_cache_dir is not a directory: {:?}", model_cache_dir);
        }

        let store_timeout_sec = file.store_timeout_sec.unwrap_or(cli.store_timeout_sec);
        let preload_model = file.preload_model.unwrap_or(cli.preload_model);
        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let max_body_bytes = file.max_body_bytes.unwrap_or(cli.max_body_bytes);
        if max_body_bytes == 0 {
            bail!("max_body_bytes must be greater than 0");
        }

        Ok(Self {
            bucket_name,
            model_key,
            model_store_endpoint,
            model_cache_dir,
            store_timeout_sec,
            preload_model,
            port,
            metrics_port,
            logging_level,
            max_body_bytes,
        })
    }
}

/// Overrides the training binary accepts on its command line.
#[derive(Debug, Clone, Default)]
pub struct TrainingCliConfig {
    pub data_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub iterations: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSettings {
    pub data_path: PathBuf,
    pub output_path: PathBuf,
    pub target: String,
    pub test_ratio: f64,
    pub seed: u64,
    pub booster: BoosterParams,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            target: VIEW_COUNT.to_string(),
            test_ratio: 0.2,
            seed: 42,
            booster: BoosterParams::default(),
        }
    }
}

impl TrainingSettings {
    /// Same precedence as [`AppConfig::resolve`]: the `[training]` section
    /// overrides command line values, which override the defaults.
    pub fn resolve(cli: &TrainingCliConfig, file: Option<TrainingConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        let data_path = file
            .data_path
            .map(PathBuf::from)
            .or_else(|| cli.data_path.clone())
            .unwrap_or(defaults.data_path);
        let output_path = file
            .output_path
            .map(PathBuf::from)
            .or_else(|| cli.output_path.clone())
            .unwrap_or(defaults.output_path);
        let target = file.target.unwrap_or(defaults.target);
        let test_ratio = file.test_ratio.unwrap_or(defaults.test_ratio);
        let seed = file.seed.or(cli.seed).unwrap_or(defaults.seed);

        let booster = BoosterParams {
            iterations: file
                .iterations
                .or(cli.iterations)
                .unwrap_or(defaults.booster.iterations),
            max_depth: file.max_depth.unwrap_or(defaults.booster.max_depth),
            shrinkage: file.shrinkage.unwrap_or(defaults.booster.shrinkage),
            min_leaf_size: file.min_leaf_size.unwrap_or(defaults.booster.min_leaf_size),
        };

        if !(test_ratio > 0.0 && test_ratio < 1.0) {
            bail!("test_ratio must be between 0 and 1, got {}", test_ratio);
        }
        if booster.iterations == 0 {
            bail!("iterations must be greater than 0");
        }
        if booster.max_depth == 0 {
            bail!("max_depth must be greater than 0");
        }
        if !(booster.shrinkage > 0.0) {
            bail!("shrinkage must be positive, got {}", booster.shrinkage);
        }
        if booster.min_leaf_size == 0 {
            bail!("min_leaf_size must be greater than 0");
        }

        Ok(Self {
            data_path,
            output_path,
            target,
            test_ratio,
            seed,
            booster,
        })
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_logging_level() {
        assert!(matches!(
            parse_logging_level("none"),
            Some(RequestsLoggingLevel::None)
        ));
        assert!(matches!(
            parse_logging_level("headers"),
            Some(RequestsLoggingLevel::Headers)
        ));
        assert!(matches!(
            parse_logging_level("BODY"),
            Some(RequestsLoggingLevel::Body)
        ));
        assert!(parse_logging_level("invalid").is_none());
    }

    #[test]
    fn test_resolve_cli_only() {
        let cache_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            bucket_name: Some("models".to_string()),
            model_key: Some("youtube/model.json".to_string()),
            model_store_endpoint: "http://localhost:9000".to_string(),
            model_cache_dir: cache_dir.path().to_path_buf(),
            store_timeout_sec: 10,
            preload_model: false,
            port: 8000,
            metrics_port: 9000,
            logging_level: RequestsLoggingLevel::Headers,
            max_body_bytes: 1024,
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.bucket_name.as_deref(), Some("models"));
        assert_eq!(config.model_key.as_deref(), Some("youtube/model.json"));
        assert_eq!(config.model_store_endpoint, "http://localhost:9000");
        assert_eq!(config.model_cache_dir, cache_dir.path());
        assert_eq!(config.store_timeout_sec, 10);
        assert!(!config.preload_model);
        assert_eq!(config.port, 8000);
        assert_eq!(config.metrics_port, 9000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Headers);
        assert_eq!(config.max_body_bytes, 1024);
    }

    #[test]
    fn test_resolve_toml_overrides_cli() {
        let cli = CliConfig {
            bucket_name: Some("cli-bucket".to_string()),
            model_key: Some("cli/model.json".to_string()),
            port: 3001,
            ..Default::default()
        };

        let file_config = FileConfig {
            bucket_name: Some("toml-bucket".to_string()),
            port: Some(4000),
            logging_level: Some("body".to_string()),
            ..Default::default()
        };

        let config = AppConfig::resolve(&cli, Some(file_config)).unwrap();

        assert_eq!(config.bucket_name.as_deref(), Some("toml-bucket"));
        assert_eq!(config.port, 4000);
        assert_eq!(config.logging_level, RequestsLoggingLevel::Body);
        // CLI value used when TOML doesn't specify
        assert_eq!(config.model_key.as_deref(), Some("cli/model.json"));
        assert_eq!(config.metrics_port, 9091);
    }

    #[test]
    fn test_missing_location_is_not_a_startup_error() {
        let config = AppConfig::resolve(&CliConfig::default(), None).unwrap();
        assert!(config.bucket_name.is_none());
        assert!(config.model_key.is_none());
    }

    #[test]
    fn test_resolve_cache_dir_not_directory_error() {
        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let cli = CliConfig {
            model_cache_dir: temp_file.path().to_path_buf(),
            ..Default::default()
        };
        let result = AppConfig::resolve(&cli, None);
        assert!(result.unwrap_err().to_string().contains("not a directory"));
    }

    #[test]
    fn test_training_defaults() {
        let settings = TrainingSettings::resolve(&TrainingCliConfig::default(), None).unwrap();
        assert_eq!(settings.data_path, PathBuf::from("data/youtube_data.csv"));
        assert_eq!(
            settings.output_path,
            PathBuf::from("artifacts/youtube_popularity_model.json")
        );
        assert_eq!(settings.target, "view_count");
        assert_eq!(settings.test_ratio, 0.2);
        assert_eq!(settings.seed, 42);
        assert_eq!(settings.booster, BoosterParams::default());
    }

    #[test]
    fn test_training_toml_overrides_cli() {
        let cli = TrainingCliConfig {
            data_path: Some(PathBuf::from("cli.csv")),
            seed: Some(7),
            iterations: Some(10),
            ..Default::default()
        };
        let file = TrainingConfig {
            iterations: Some(300),
            max_depth: Some(4),
            ..Default::default()
        };

        let settings = TrainingSettings::resolve(&cli, Some(file)).unwrap();
        assert_eq!(settings.data_path, PathBuf::from("cli.csv"));
        assert_eq!(settings.seed, 7);
        assert_eq!(settings.booster.iterations, 300);
        assert_eq!(settings.booster.max_depth, 4);
    }

    #[test]
    fn test_training_rejects_bad_values() {
        for file in [
            TrainingConfig {
                test_ratio: Some(1.0),
                ..Default::default()
            },
            TrainingConfig {
                iterations: Some(0),
                ..Default::default()
            },
            TrainingConfig {
                shrinkage: Some(-0.1),
                ..Default::default()
            },
        ] {
            assert!(TrainingSettings::resolve(&TrainingCliConfig::default(), Some(file)).is_err());
        }
    }
}
