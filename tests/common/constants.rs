//! Shared constants for end-to-end tests
//!
//! When the test model or its storage layout changes, update only this file.

// ============================================================================
// Model Storage
// ============================================================================

/// Bucket the test model is stored in
pub const TEST_BUCKET: &str = "models";

/// Object key of the test model
pub const TEST_MODEL_KEY: &str = "youtube/popularity_model.json";

/// Number of raw rows the test model is trained from
pub const TRAINING_ROWS: usize = 40;

/// Number of channels appearing in the training rows
pub const TRAINING_CHANNELS: usize = 4;

/// Boosting rounds for the test model (kept small for speed)
pub const TEST_ITERATIONS: usize = 10;

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Request body limit used by test servers (bytes)
pub const TEST_MAX_BODY_BYTES: usize = 16 * 1024;
