//! View-count predictor: feature engineering, model training and the
//! prediction service that serves the trained model.

pub mod config;
pub mod features;
pub mod model;
pub mod server;
pub mod storage;
pub mod training;

pub use features::{transform, transform_one, FeatureRecord, PipelineError, RawRecord};
pub use model::{ModelArtifact, ModelError};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use storage::{ArtifactError, ModelProvider};
