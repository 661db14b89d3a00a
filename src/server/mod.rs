pub mod config;
mod error;
mod http_layers;
pub mod metrics;
pub mod predict;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, MODEL_UNAVAILABLE_MESSAGE};
pub use http_layers::*;
pub use server::{make_app, make_metrics_app, run_server};
