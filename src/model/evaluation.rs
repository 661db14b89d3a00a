use super::ModelError;
use serde::{Deserialize, Serialize};

/// Hold-out performance recorded alongside a trained model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub mean_squared_error: f64,
    pub r2: f64,
    pub test_rows: usize,
}

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().max(1) as f64;
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n
}

/// Coefficient of determination; 0.0 when the targets have no variance.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let total: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    if total == 0.0 {
        return 0.0;
    }
    let residual: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    1.0 - residual / total
}

pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<EvaluationMetrics, ModelError> {
    if actual.is_empty() {
        return Err(ModelError::EmptyDataset("evaluation"));
    }
    if actual.len() != predicted.len() {
        return Err(ModelError::LengthMismatch {
            features: predicted.len(),
            targets: actual.len(),
        });
    }
    Ok(EvaluationMetrics {
        mean_squared_error: mean_squared_error(actual, predicted),
        r2: r2_score(actual, predicted),
        test_rows: actual.len(),
    })
}
