use anyhow::{Context, Result};
use std::time::Duration;

use tracing::info;

use axum::{
    extract::{DefaultBodyLimit, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::metrics::metrics_handler;
use super::predict::{engineered_features, invoke, predict, predict_preflight};
use super::{allow_any_origin, log_requests, state::*, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
    pub model_loaded: bool,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: state.model_provider.is_loaded(),
    };
    Json(stats)
}

pub fn make_app(config: ServerConfig, model_provider: GuardedModelProvider) -> Router {
    let state = ServerState::new(config.clone(), model_provider);

    let prediction_routes: Router = Router::new()
        .route("/predict", post(predict).options(predict_preflight))
        .route("/invoke", post(invoke))
        .route("/features", post(engineered_features))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state.clone());

    let home_router: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone());

    home_router
        .merge(prediction_routes)
        .layer(middleware::from_fn(allow_any_origin))
        .layer(middleware::from_fn_with_state(state, log_requests))
}

pub fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

pub async fn run_server(
    config: ServerConfig,
    model_provider: GuardedModelProvider,
    metrics_port: u16,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, model_provider);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    let main_server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    let metrics_server =
        axum::serve(metrics_listener, make_metrics_app()).with_graceful_shutdown(shutdown_signal());

    tokio::try_join!(
        async { main_server.await.context("Server failed") },
        async { metrics_server.await.context("Metrics server failed") },
    )?;
    Ok(())
}
