//! Regression model for view counts: column encoding, train/test split,
//! gradient boosted trees and the serialized artifact the server loads.

mod artifact;
mod encoder;
mod evaluation;
mod split;

pub use artifact::{BoosterParams, ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use encoder::{CategoricalColumn, FeatureEncoder, CATEGORICAL_COLUMNS};
pub use evaluation::{evaluate, mean_squared_error, r2_score, EvaluationMetrics};
pub use split::train_test_split;

use crate::features::PipelineError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("at least 2 rows are needed to fit a model, got {0}")]
    TooFewRows(usize),

    #[error("no rows available for {0}")]
    EmptyDataset(&'static str),

    #[error("{features} feature rows but {targets} targets")]
    LengthMismatch { features: usize, targets: usize },

    #[error("artifact format version {found} is not supported (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },

    #[error("artifact I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),
}
