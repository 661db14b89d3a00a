//! Offline training: CSV in, serialized model artifact out.

mod dataset;

pub use dataset::{cell_value, load_csv, read_csv};

use crate::config::TrainingSettings;
use crate::features::{transform_batch, FeatureRecord, PipelineMode, RawRecord, PUBLISHED_DATE};
use crate::model::{evaluate, train_test_split, EvaluationMetrics, ModelArtifact};
use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub train_rows: usize,
    pub evaluation: EvaluationMetrics,
    pub output_path: PathBuf,
}

/// Loads the dataset, fits a model, evaluates it on the held-out share and
/// writes the artifact. Progress lines go to `out`.
pub fn run_training<W: Write>(settings: &TrainingSettings, out: &mut W) -> Result<TrainingReport> {
    writeln!(out, "Starting the model training process...")?;

    let raw = load_csv(&settings.data_path)?;
    info!("Loaded {} rows from {:?}", raw.len(), settings.data_path);

    let (artifact, mut report) = train_from_records(&raw, settings, out)?;
    artifact
        .save(&settings.output_path)
        .with_context(|| format!("Failed to save model to {:?}", settings.output_path))?;
    report.output_path = settings.output_path.clone();

    writeln!(
        out,
        "\nModel training complete. Model saved to: {}",
        settings.output_path.display()
    )?;
    Ok(report)
}

/// Everything in [`run_training`] except the file I/O.
pub fn train_from_records<W: Write>(
    raw: &[RawRecord],
    settings: &TrainingSettings,
    out: &mut W,
) -> Result<(ModelArtifact, TrainingReport)> {
    let batch = transform_batch(raw, PipelineMode::Training)?;
    if batch.dropped > 0 {
        info!(
            "Dropped {} of {} rows with an unparseable {}",
            batch.dropped,
            raw.len(),
            PUBLISHED_DATE
        );
    }

    let rows = labelled_rows(batch.records, &settings.target)?;
    if rows.len() < 2 {
        bail!("Not enough usable rows to train on: {}", rows.len());
    }

    let (train, test) = train_test_split(rows, settings.test_ratio, settings.seed);
    debug!("Split into {} train and {} test rows", train.len(), test.len());
    let (train_x, train_y): (Vec<_>, Vec<_>) = train.into_iter().unzip();
    let (test_x, test_y): (Vec<_>, Vec<_>) = test.into_iter().unzip();

    writeln!(out, "Training the model...")?;
    let artifact = ModelArtifact::fit(&train_x, &train_y, &settings.target, &settings.booster)?;

    writeln!(out, "Evaluating the model...")?;
    let predictions = artifact.predict(&test_x)?;
    let evaluation = evaluate(&test_y, &predictions)?;
    write!(out, "{}", format_evaluation(&evaluation))?;

    let report = TrainingReport {
        rows_read: raw.len(),
        rows_dropped: batch.dropped,
        train_rows: train_x.len(),
        evaluation,
        output_path: PathBuf::new(),
    };
    Ok((artifact.with_evaluation(evaluation), report))
}

fn labelled_rows(records: Vec<FeatureRecord>, target: &str) -> Result<Vec<(FeatureRecord, f64)>> {
    records
        .into_iter()
        .map(|mut record| {
            let label = record
                .take_target(target)
                .with_context(|| format!("Target column {} is missing", target))?;
            Ok((record, label))
        })
        .collect()
}

pub fn format_evaluation(evaluation: &EvaluationMetrics) -> String {
    format!(
        "Model Performance on Test Set:\n  - Mean Squared Error (MSE): {}\n  - R-squared (R²): {:.2}\n",
        format_thousands(evaluation.mean_squared_error),
        evaluation.r2
    )
}

/// Two decimals with comma-grouped thousands, e.g. `1,234,567.89`.
pub fn format_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value.is_sign_negative() && fixed != "0.00" {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}
