//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per predictor endpoint.
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::{Method, Response};
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    pub async fn predict(&self, record: &Value) -> Response {
        self.client
            .post(format!("{}/predict", self.base_url))
            .json(record)
            .send()
            .await
            .expect("Predict request failed")
    }

    /// Sends `body` as-is, without JSON encoding it.
    pub async fn predict_raw(&self, body: &str) -> Response {
        self.client
            .post(format!("{}/predict", self.base_url))
            .header("Content-Type", "application/json")
            .body(body.to_string())
            .send()
            .await
            .expect("Predict request failed")
    }

    pub async fn predict_preflight(&self) -> Response {
        self.client
            .request(Method::OPTIONS, format!("{}/predict", self.base_url))
            .header("Origin", "https://example.com")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .expect("Preflight request failed")
    }

    /// Wraps `body` in a REST-style gateway event.
    pub async fn invoke(&self, method: &str, body: Value) -> Response {
        self.invoke_event(&json!({ "httpMethod": method, "body": body }))
            .await
    }

    pub async fn invoke_event(&self, event: &Value) -> Response {
        self.client
            .post(format!("{}/invoke", self.base_url))
            .json(event)
            .send()
            .await
            .expect("Invoke request failed")
    }

    pub async fn features(&self, record: &Value) -> Response {
        self.client
            .post(format!("{}/features", self.base_url))
            .json(record)
            .send()
            .await
            .expect("Features request failed")
    }
}
