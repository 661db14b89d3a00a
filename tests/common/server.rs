//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own model store and cache dir.

use super::constants::*;
use super::fixtures::create_model_store;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use viewcount_predictor::server::state::GuardedModelProvider;
use viewcount_predictor::server::{make_app, RequestsLoggingLevel, ServerConfig};
use viewcount_predictor::storage::{LocalObjectStore, ModelProvider};

/// Test server instance backed by a local object store
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Provider shared with the app, for checking load state in tests
    pub model_provider: GuardedModelProvider,

    // Private fields - keep resources alive until drop
    _store_dir: TempDir,
    _cache_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a server whose store holds a freshly trained model.
    ///
    /// The model is loaded lazily on the first prediction request.
    pub async fn spawn() -> Self {
        let store_dir = create_model_store().await;
        Self::spawn_with_store(store_dir, Some(TEST_BUCKET), Some(TEST_MODEL_KEY)).await
    }

    /// Spawns a server pointing at an empty store, so every load fails.
    pub async fn spawn_without_model() -> Self {
        let store_dir = TempDir::new().expect("Failed to create store dir");
        Self::spawn_with_store(store_dir, Some(TEST_BUCKET), Some(TEST_MODEL_KEY)).await
    }

    /// Spawns a server with no bucket or key configured.
    pub async fn spawn_unconfigured() -> Self {
        let store_dir = TempDir::new().expect("Failed to create store dir");
        Self::spawn_with_store(store_dir, None, None).await
    }

    async fn spawn_with_store(
        store_dir: TempDir,
        bucket: Option<&str>,
        key: Option<&str>,
    ) -> Self {
        let cache_dir = TempDir::new().expect("Failed to create cache dir");

        let model_provider: GuardedModelProvider = Arc::new(ModelProvider::new(
            Arc::new(LocalObjectStore::new(store_dir.path().to_path_buf())),
            bucket.map(str::to_string),
            key.map(str::to_string),
            cache_dir.path().to_path_buf(),
        ));

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            max_body_bytes: TEST_MAX_BODY_BYTES,
        };
        let app = make_app(config, model_provider.clone());

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            model_provider,
            _store_dir: store_dir,
            _cache_dir: cache_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the / endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
