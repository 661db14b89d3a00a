use axum::extract::FromRef;

use crate::storage::ModelProvider;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedModelProvider = Arc<ModelProvider>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub model_provider: GuardedModelProvider,
}

impl ServerState {
    pub fn new(config: ServerConfig, model_provider: GuardedModelProvider) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            model_provider,
        }
    }
}

impl FromRef<ServerState> for GuardedModelProvider {
    fn from_ref(input: &ServerState) -> Self {
        input.model_provider.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
