use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use viewcount_predictor::config::{FileConfig, TrainingCliConfig, TrainingSettings};
use viewcount_predictor::training::run_training;

/// Trains the view-count model from a CSV export and writes the artifact.
#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to TOML configuration file. The [training] section overrides CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// CSV dataset to train on.
    #[clap(long)]
    pub data: Option<PathBuf>,

    /// Where to write the trained model.
    #[clap(long)]
    pub output: Option<PathBuf>,

    /// Seed for the train/test split.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Number of boosting rounds.
    #[clap(long)]
    pub iterations: Option<usize>,
}

/// INFO unless `env_var` says otherwise, so progress lines show by default.
fn log_filter(env_var: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(env_var)
        .from_env_lossy()
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(log_filter("LOG_LEVEL"))
        .try_init()
        .context("Failed to initialize logging")?;

    let training_config = match &cli_args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            FileConfig::load(path)?.training
        }
        None => None,
    };

    let cli_config = TrainingCliConfig {
        data_path: cli_args.data,
        output_path: cli_args.output,
        seed: cli_args.seed,
        iterations: cli_args.iterations,
    };
    let settings = TrainingSettings::resolve(&cli_config, training_config)?;

    let report = run_training(&settings, &mut std::io::stdout())?;
    info!(
        "Trained on {} rows ({} dropped)",
        report.train_rows, report.rows_dropped
    );
    Ok(())
}
