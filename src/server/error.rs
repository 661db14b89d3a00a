use crate::features::PipelineError;
use crate::model::ModelError;
use crate::storage::ArtifactError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::{error, warn};

pub const MODEL_UNAVAILABLE_MESSAGE: &str = "Model could not be loaded.";

/// Everything a prediction request can fail with, as seen by the client.
#[derive(Debug)]
pub enum ApiError {
    /// The model is not in memory and loading it failed.
    ModelUnavailable(ArtifactError),
    /// The request could not be turned into a prediction.
    PredictionFailed { kind: &'static str, message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::PredictionFailed {
            kind: "bad_request",
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::ModelUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PredictionFailed { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Self::ModelUnavailable(_) => json!({ "error": MODEL_UNAVAILABLE_MESSAGE }),
            Self::PredictionFailed { message, .. } => {
                json!({ "error": format!("Prediction failed: {message}") })
            }
        }
    }

    /// Label used for the predictions counter.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::ModelUnavailable(_) => "model_unavailable",
            Self::PredictionFailed { kind, .. } => kind,
        }
    }

    pub fn log(&self) {
        match self {
            Self::ModelUnavailable(e) => error!("Model unavailable: {}", e),
            Self::PredictionFailed { message, .. } => warn!("Prediction failed: {}", message),
        }
    }
}

impl From<ArtifactError> for ApiError {
    fn from(value: ArtifactError) -> Self {
        Self::ModelUnavailable(value)
    }
}

impl From<PipelineError> for ApiError {
    fn from(value: PipelineError) -> Self {
        Self::PredictionFailed {
            kind: value.kind(),
            message: value.to_string(),
        }
    }
}

impl From<ModelError> for ApiError {
    fn from(value: ModelError) -> Self {
        match value {
            ModelError::Pipeline(e) => e.into(),
            other => {
                error!("Model failed during prediction: {}", other);
                Self::PredictionFailed {
                    kind: "model",
                    message: "the model could not score this record".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        (self.status(), Json(self.body())).into_response()
    }
}
