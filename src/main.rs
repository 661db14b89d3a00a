use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use std::{fmt::Debug, path::PathBuf};
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use viewcount_predictor::config;
use viewcount_predictor::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use viewcount_predictor::storage::{store_from_endpoint, ModelProvider};

fn parse_path(s: &str) -> Result<PathBuf, String> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(format!("Error resolving path '{}': {}", s, msg));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir().map_err(|e| format!("Failed to get current dir: {}", e))?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Bucket holding the serialized model.
    #[clap(long, env = "BUCKET_NAME")]
    pub bucket_name: Option<String>,

    /// Object key of the serialized model inside the bucket.
    #[clap(long, env = "MODEL_KEY")]
    pub model_key: Option<String>,

    /// Object store base URL, or a local directory laid out as <bucket>/<key>.
    #[clap(long, env = "MODEL_STORE_ENDPOINT", default_value = "https://s3.amazonaws.com")]
    pub model_store_endpoint: String,

    /// Where the downloaded model is written before loading. Defaults to the system temp dir.
    #[clap(long, value_parser = parse_path)]
    pub model_cache_dir: Option<PathBuf>,

    /// Timeout in seconds for object store requests.
    #[clap(long, default_value_t = 30)]
    pub store_timeout_sec: u64,

    /// Load the model on the first request instead of at startup.
    #[clap(long)]
    pub no_preload: bool,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Largest accepted request body, in bytes.
    #[clap(long, default_value_t = 64 * 1024)]
    pub max_body_bytes: usize,
}

/// Convert CLI args to CliConfig for config resolution
impl From<&CliArgs> for config::CliConfig {
    fn from(args: &CliArgs) -> Self {
        config::CliConfig {
            bucket_name: args.bucket_name.clone(),
            model_key: args.model_key.clone(),
            model_store_endpoint: args.model_store_endpoint.clone(),
            model_cache_dir: args
                .model_cache_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            store_timeout_sec: args.store_timeout_sec,
            preload_model: !args.no_preload,
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            max_body_bytes: args.max_body_bytes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    // Load TOML config if provided
    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            Some(config::FileConfig::load(path)?)
        }
        None => None,
    };

    // Resolve final configuration (TOML overrides CLI)
    let cli_config: config::CliConfig = (&cli_args).into();
    let app_config = config::AppConfig::resolve(&cli_config, file_config)?;

    info!("Configuration loaded:");
    info!("  bucket_name: {:?}", app_config.bucket_name);
    info!("  model_key: {:?}", app_config.model_key);
    info!("  model_store_endpoint: {}", app_config.model_store_endpoint);
    info!("  port: {}", app_config.port);

    info!("Initializing metrics...");
    metrics::init_metrics();

    let store = store_from_endpoint(
        &app_config.model_store_endpoint,
        Duration::from_secs(app_config.store_timeout_sec),
    );
    info!("Model store: {}", store.describe());

    let model_provider = Arc::new(ModelProvider::new(
        store,
        app_config.bucket_name.clone(),
        app_config.model_key.clone(),
        app_config.model_cache_dir.clone(),
    ));

    // A failed preload is not fatal, requests retry the load.
    if app_config.preload_model {
        info!("Preloading model...");
        if let Err(e) = model_provider.get().await {
            error!("Model preload failed, will retry on first request: {}", e);
        }
    }

    let server_config = ServerConfig {
        requests_logging_level: app_config.logging_level,
        port: app_config.port,
        max_body_bytes: app_config.max_body_bytes,
    };

    info!(
        "Ready to serve at port {}, metrics at port {}",
        app_config.port, app_config.metrics_port
    );
    run_server(server_config, model_provider, app_config.metrics_port).await
}
