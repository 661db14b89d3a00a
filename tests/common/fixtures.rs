//! Test fixtures: raw training rows, a trained model in a local object
//! store, and the reference prediction request.

use super::constants::*;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use viewcount_predictor::config::TrainingSettings;
use viewcount_predictor::features::RawRecord;
use viewcount_predictor::model::BoosterParams;
use viewcount_predictor::storage::{ArtifactLocation, LocalObjectStore};
use viewcount_predictor::training::train_from_records;

fn object(value: Value) -> RawRecord {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

/// Raw rows shaped like the scraped dataset. Views grow with likes so the
/// model has something to learn.
pub fn raw_training_rows() -> Vec<RawRecord> {
    (0..TRAINING_ROWS as i64)
        .map(|i| {
            object(json!({
                "video_id": format!("vid{:03}", i),
                "title": format!("Video number {}", i),
                "description": "some text",
                "thumbnail": "https://example.com/thumb.jpg",
                "channel_title": format!("Channel {}", i % TRAINING_CHANNELS as i64),
                "category_id": 10 + (i % 3),
                "published_date": format!("2023-{:02}-{:02}T{:02}:15:00Z", 1 + i % 12, 1 + i % 28, i % 24),
                "duration": format!("PT{}M{}S", 1 + i % 20, i % 60),
                "tags": "['music', 'live', 'cover']",
                "view_count": 5_000 + 1_000 * i,
                "like_count": 50 + 10 * i,
                "comment_count": 5 + i,
            }))
        })
        .collect()
}

/// Writes the training rows as a CSV file, like a dataset export.
pub fn write_training_csv(dir: &Path) -> PathBuf {
    let path = dir.join("youtube_data.csv");
    let header = [
        "video_id",
        "title",
        "channel_title",
        "category_id",
        "published_date",
        "duration",
        "tags",
        "view_count",
        "like_count",
        "comment_count",
    ];
    let mut writer = csv::Writer::from_path(&path).expect("Failed to create CSV");
    writer.write_record(header).expect("Failed to write CSV header");
    for row in raw_training_rows() {
        let cells: Vec<String> = header
            .iter()
            .map(|column| match &row[*column] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        writer.write_record(&cells).expect("Failed to write CSV row");
    }
    writer.flush().expect("Failed to flush CSV");
    path
}

/// Trains a small model and stores it in a fresh local object store.
///
/// Returns the temp dir acting as the store root.
pub async fn create_model_store() -> TempDir {
    let settings = TrainingSettings {
        booster: BoosterParams {
            iterations: TEST_ITERATIONS,
            ..Default::default()
        },
        ..Default::default()
    };
    let (artifact, _) = train_from_records(&raw_training_rows(), &settings, &mut std::io::sink())
        .expect("Failed to train test model");

    let root = TempDir::new().expect("Failed to create store dir");
    let store = LocalObjectStore::new(root.path().to_path_buf());
    let location = ArtifactLocation::resolve(Some(TEST_BUCKET), Some(TEST_MODEL_KEY))
        .expect("Invalid test location");
    store
        .put_object(
            &location,
            &artifact.to_json_bytes().expect("Failed to serialize model"),
        )
        .await
        .expect("Failed to store test model");
    root
}

/// The example request used throughout the docs.
pub fn reference_record() -> Value {
    json!({
        "category_id": "10",
        "duration": "PT10M30S",
        "tags": "['music','live']",
        "published_date": "2023-05-15T14:30:00",
        "channel_title": "TestChannel",
        "like_count": 100,
        "comment_count": 10
    })
}
