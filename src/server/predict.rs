//! Prediction endpoints: plain HTTP, gateway event envelope and a feature
//! preview for debugging clients.

use super::error::ApiError;
use super::http_layers::{preflight_headers, ALLOWED_HEADERS, ALLOWED_METHODS};
use super::metrics::record_prediction;
use super::state::GuardedModelProvider;
use crate::features::{transform_one, FeatureRecord, RawRecord};
use crate::storage::ModelProvider;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_view_count: f64,
}

/// Empty bodies read as JSON `null`.
fn parse_json(bytes: &[u8]) -> Result<Value, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes)
        .map_err(|e| ApiError::bad_request(format!("request body is not valid JSON: {e}")))
}

/// Body extraction failures, e.g. a body over the configured limit.
fn body_rejection(rejection: BytesRejection) -> ApiError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::bad_request("request body is too large")
    } else {
        ApiError::bad_request(format!(
            "could not read request body: {}",
            rejection.body_text()
        ))
    }
}

fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Value, ApiError> {
    parse_json(&body.map_err(body_rejection)?)
}

/// Accepts a JSON object, or a string holding one. `null` is an empty record.
pub fn parse_record(body: Value) -> Result<RawRecord, ApiError> {
    match body {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(RawRecord::new()),
        Value::String(text) => match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ApiError::bad_request("request body must be a JSON object")),
            Err(e) => Err(ApiError::bad_request(format!(
                "request body is not valid JSON: {e}"
            ))),
        },
        _ => Err(ApiError::bad_request("request body must be a JSON object")),
    }
}

/// The model is resolved before the body is looked at, so a missing model
/// wins over a malformed request.
pub async fn predict_with(
    provider: &ModelProvider,
    body: Result<Value, ApiError>,
) -> Result<PredictionResponse, ApiError> {
    let result = async {
        let model = provider.get().await?;
        let raw = parse_record(body?)?;
        let features = transform_one(&raw)?;
        debug!("Making prediction on input data: {:?}", features);
        let predicted_view_count = model.predict_one(&features)?;
        info!(
            "Prediction successful. Predicted view count: {}",
            predicted_view_count
        );
        Ok::<_, ApiError>(PredictionResponse {
            predicted_view_count,
        })
    }
    .await;

    match &result {
        Ok(response) => record_prediction("success", Some(response.predicted_view_count)),
        Err(e) => record_prediction(e.outcome(), None),
    }
    result
}

pub async fn predict(
    State(provider): State<GuardedModelProvider>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    predict_with(&provider, read_body(body)).await.map(Json)
}

pub async fn predict_preflight() -> Response {
    let mut response = StatusCode::OK.into_response();
    preflight_headers(response.headers_mut());
    response
}

pub async fn engineered_features(
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<FeatureRecord>, ApiError> {
    let raw = parse_record(read_body(body)?)?;
    Ok(Json(transform_one(&raw)?))
}

#[derive(Debug, Default, Deserialize)]
pub struct HttpContext {
    pub method: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestContext {
    pub http: Option<HttpContext>,
}

/// Proxy event as delivered by an API gateway.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEvent {
    pub http_method: Option<String>,
    pub request_context: Option<RequestContext>,
    #[serde(default)]
    pub body: Value,
}

impl GatewayEvent {
    pub fn method(&self) -> Option<&str> {
        self.http_method.as_deref().or_else(|| {
            self.request_context
                .as_ref()
                .and_then(|c| c.http.as_ref())
                .and_then(|h| h.method.as_deref())
        })
    }

    pub fn is_preflight(&self) -> bool {
        self.method()
            .is_some_and(|m| m.eq_ignore_ascii_case("OPTIONS"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl GatewayResponse {
    fn base_headers() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        ])
    }

    pub fn preflight() -> Self {
        let mut headers = Self::base_headers();
        headers.insert(
            "Access-Control-Allow-Methods".to_string(),
            ALLOWED_METHODS.to_string(),
        );
        headers.insert(
            "Access-Control-Allow-Headers".to_string(),
            ALLOWED_HEADERS.to_string(),
        );
        Self {
            status_code: 200,
            headers,
            body: String::new(),
        }
    }

    pub fn from_result(result: Result<PredictionResponse, ApiError>) -> Self {
        let (status_code, body) = match result {
            Ok(response) => (
                200,
                serde_json::json!({ "predicted_view_count": response.predicted_view_count }),
            ),
            Err(e) => {
                e.log();
                (e.status().as_u16(), e.body())
            }
        };
        Self {
            status_code,
            headers: Self::base_headers(),
            body: body.to_string(),
        }
    }
}

pub async fn invoke(
    State(provider): State<GuardedModelProvider>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<GatewayResponse>, ApiError> {
    let body = body.map_err(body_rejection)?;
    let event: GatewayEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid gateway event: {e}")))?;
    debug!("Received event with method {:?}", event.method());

    if event.is_preflight() {
        return Ok(Json(GatewayResponse::preflight()));
    }

    let result = predict_with(&provider, Ok(event.body)).await;
    Ok(Json(GatewayResponse::from_result(result)))
}
