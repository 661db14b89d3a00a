//! Request logging middleware

use super::super::state::ServerState;
use crate::server::metrics::{normalize_path, record_http_request};
use axum::extract::State;
use axum::{
    body::{Body, HttpBody},
    http::{header, HeaderMap, HeaderName, Request, Response},
    middleware::Next,
    response::IntoResponse,
};
use byte_unit::Byte;
use std::time::Instant;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

#[derive(PartialEq, PartialOrd, Clone, Debug, Default, clap::ValueEnum)]
pub enum RequestsLoggingLevel {
    None,
    #[default]
    Path,
    /// Also logs the headers a prediction client or the CORS layer cares about.
    Headers,
    /// Also logs body sizes against the configured limit. Bodies are never buffered.
    Body,
}

impl std::fmt::Display for RequestsLoggingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

const REQUEST_HEADERS: [HeaderName; 4] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::ORIGIN,
    header::USER_AGENT,
];

const RESPONSE_HEADERS: [HeaderName; 3] = [
    header::CONTENT_TYPE,
    header::CONTENT_LENGTH,
    header::ACCESS_CONTROL_ALLOW_ORIGIN,
];

fn log_headers(direction: &str, headers: &HeaderMap, names: &[HeaderName]) {
    for name in names {
        if let Some(value) = headers.get(name) {
            info!("  {} {}: {:?}", direction, name, value);
        }
    }
}

/// Human readable body size, flagged when it is over `limit`.
fn describe_body(size: Option<u64>, limit: Option<usize>) -> String {
    let Some(size) = size else {
        return "size unknown".to_string();
    };
    let described = format!("{:#}", Byte::from_u64(size));
    match limit {
        Some(limit) if size > limit as u64 => {
            format!("{} (over the {:#} limit)", described, Byte::from_u64(limit as u64))
        }
        _ => described,
    }
}

pub async fn log_requests(
    State(state): State<ServerState>,
    request: Request<Body>,
    next: Next,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    let span = info_span!("request", id = %request_id);
    handle(state, request, next).instrument(span).await
}

async fn handle(state: ServerState, request: Request<Body>, next: Next) -> Response<Body> {
    let level = state.config.requests_logging_level.clone();
    let start = Instant::now();

    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    if level > RequestsLoggingLevel::None {
        info!(">>> {} {}", method, request.uri());
    }
    if level >= RequestsLoggingLevel::Headers {
        log_headers("Req", request.headers(), &REQUEST_HEADERS);
    }
    if level >= RequestsLoggingLevel::Body {
        let size = request.body().size_hint().exact();
        info!(
            "  Req Body: {}",
            describe_body(size, Some(state.config.max_body_bytes))
        );
    }

    let response = next.run(request).await;

    if level >= RequestsLoggingLevel::Headers {
        log_headers("Resp", response.headers(), &RESPONSE_HEADERS);
    }
    if level >= RequestsLoggingLevel::Body {
        info!(
            "  Resp Body: {}",
            describe_body(response.body().size_hint().exact(), None)
        );
    }

    let status = response.status().as_u16();
    let duration = start.elapsed();

    if level > RequestsLoggingLevel::None {
        info!("<<< {} ({}ms)", status, duration.as_millis());
    }

    record_http_request(&method, normalize_path(&path), status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        let none = RequestsLoggingLevel::None;

        assert!(none < RequestsLoggingLevel::Headers);
        assert!(RequestsLoggingLevel::Body > RequestsLoggingLevel::None);
        assert_eq!(RequestsLoggingLevel::default(), RequestsLoggingLevel::Path);
    }

    #[test]
    fn body_sizes_are_flagged_over_the_limit() {
        assert_eq!(describe_body(None, Some(1024)), "size unknown");

        let small = describe_body(Some(512), Some(1024));
        assert!(!small.contains("over"), "{small}");

        let large = describe_body(Some(4096), Some(1024));
        assert!(large.contains("over the"), "{large}");

        let response = describe_body(Some(1_000_000), None);
        assert!(!response.contains("over"), "{response}");
    }
}
