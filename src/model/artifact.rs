use super::{EvaluationMetrics, FeatureEncoder, ModelError};
use crate::features::FeatureRecord;
use chrono::{DateTime, Utc};
use gbdt::config::Config;
use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Gradient boosting hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoosterParams {
    pub iterations: usize,
    pub max_depth: u32,
    pub shrinkage: f32,
    pub min_leaf_size: usize,
}

impl Default for BoosterParams {
    fn default() -> Self {
        Self {
            iterations: 100,
            max_depth: 6,
            shrinkage: 0.1,
            min_leaf_size: 1,
        }
    }
}

impl BoosterParams {
    fn to_config(&self, feature_size: usize) -> Config {
        let mut cfg = Config::new();
        cfg.set_feature_size(feature_size);
        cfg.set_max_depth(self.max_depth);
        cfg.set_iterations(self.iterations);
        cfg.set_shrinkage(self.shrinkage);
        cfg.set_min_leaf_size(self.min_leaf_size);
        cfg.set_loss("SquaredError");
        cfg.set_data_sample_ratio(1.0);
        cfg.set_feature_sample_ratio(1.0);
        cfg.set_training_optimization_level(2);
        cfg.set_debug(false);
        cfg
    }
}

/// A trained regressor bundled with its encoder, ready to be stored and
/// served.
#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub trained_at: DateTime<Utc>,
    pub target: String,
    pub training_rows: usize,
    pub params: BoosterParams,
    pub encoder: FeatureEncoder,
    pub evaluation: Option<EvaluationMetrics>,
    booster: GBDT,
}

impl fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("format_version", &self.format_version)
            .field("trained_at", &self.trained_at)
            .field("target", &self.target)
            .field("training_rows", &self.training_rows)
            .field("params", &self.params)
            .field("encoder", &self.encoder)
            .field("evaluation", &self.evaluation)
            .finish_non_exhaustive()
    }
}

impl ModelArtifact {
    pub fn fit(
        features: &[FeatureRecord],
        targets: &[f64],
        target: &str,
        params: &BoosterParams,
    ) -> Result<Self, ModelError> {
        if features.len() < 2 {
            return Err(ModelError::TooFewRows(features.len()));
        }
        if features.len() != targets.len() {
            return Err(ModelError::LengthMismatch {
                features: features.len(),
                targets: targets.len(),
            });
        }

        let encoder = FeatureEncoder::fit(features);
        let mut data = Vec::with_capacity(features.len());
        for (record, label) in features.iter().zip(targets) {
            let row = encoder.encode(record)?;
            data.push(Data::new_training_data(row, 1.0, *label as f32, None));
        }

        debug!(
            "Fitting {} trees on {} rows x {} columns",
            params.iterations,
            data.len(),
            encoder.width()
        );
        let mut booster = GBDT::new(&params.to_config(encoder.width()));
        booster.fit(&mut data);

        Ok(Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            trained_at: Utc::now(),
            target: target.to_string(),
            training_rows: features.len(),
            params: params.clone(),
            encoder,
            evaluation: None,
            booster,
        })
    }

    pub fn with_evaluation(mut self, evaluation: EvaluationMetrics) -> Self {
        self.evaluation = Some(evaluation);
        self
    }

    /// Predictions are never negative.
    pub fn predict(&self, features: &[FeatureRecord]) -> Result<Vec<f64>, ModelError> {
        if features.is_empty() {
            return Ok(Vec::new());
        }
        let mut data = Vec::with_capacity(features.len());
        for record in features {
            data.push(Data::new_test_data(self.encoder.encode(record)?, None));
        }
        Ok(self
            .booster
            .predict(&data)
            .into_iter()
            .map(|p| f64::from(p).max(0.0))
            .collect())
    }

    pub fn predict_one(&self, record: &FeatureRecord) -> Result<f64, ModelError> {
        self.predict(std::slice::from_ref(record))?
            .into_iter()
            .next()
            .ok_or(ModelError::EmptyDataset("prediction"))
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ModelError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        #[derive(Deserialize)]
        struct Header {
            format_version: u32,
        }
        let header: Header = serde_json::from_slice(bytes)?;
        if header.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ModelError::UnsupportedFormat {
                found: header.format_version,
                expected: ARTIFACT_FORMAT_VERSION,
            });
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Writes the artifact next to `path` first and renames it into place.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(&self.to_json_bytes()?)?;
        file.persist(path).map_err(|e| ModelError::Io(e.error))?;
        info!("Model artifact written to {:?}", path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{NumericValue, LIKE_COUNT};
    use std::collections::BTreeMap;

    fn record(channel: &str, hour: u8, likes: i64) -> FeatureRecord {
        let mut numeric = BTreeMap::new();
        numeric.insert(LIKE_COUNT.to_string(), NumericValue::Int(likes));
        FeatureRecord {
            publish_day_of_week: 1,
            publish_hour: hour,
            duration_seconds: 300,
            tag_count: 2,
            category_id: 10,
            channel_title: channel.to_string(),
            numeric,
        }
    }

    fn small_params() -> BoosterParams {
        BoosterParams {
            iterations: 20,
            max_depth: 3,
            shrinkage: 0.3,
            min_leaf_size: 1,
        }
    }

    fn training_set() -> (Vec<FeatureRecord>, Vec<f64>) {
        let mut features = Vec::new();
        let mut targets = Vec::new();
        for i in 0..40 {
            let likes = i * 10;
            features.push(record(if i % 2 == 0 { "A" } else { "B" }, (i % 24) as u8, likes));
            targets.push((likes * 100) as f64);
        }
        (features, targets)
    }

    #[test]
    fn fits_and_predicts() {
        let (features, targets) = training_set();
        let artifact =
            ModelArtifact::fit(&features, &targets, "view_count", &small_params()).unwrap();

        let predictions = artifact.predict(&features).unwrap();
        assert_eq!(predictions.len(), features.len());
        assert!(predictions.iter().all(|p| *p >= 0.0));
        assert!(predictions[39] > predictions[0]);
    }

    #[test]
    fn unknown_channel_still_predicts() {
        let (features, targets) = training_set();
        let artifact =
            ModelArtifact::fit(&features, &targets, "view_count", &small_params()).unwrap();
        let prediction = artifact.predict_one(&record("Brand New", 3, 100)).unwrap();
        assert!(prediction.is_finite());
        assert!(prediction >= 0.0);
    }

    #[test]
    fn rejects_empty_and_mismatched_input() {
        assert!(matches!(
            ModelArtifact::fit(&[], &[], "view_count", &small_params()),
            Err(ModelError::TooFewRows(0))
        ));
        let (features, targets) = training_set();
        assert!(matches!(
            ModelArtifact::fit(&features[..1], &targets[..1], "view_count", &small_params()),
            Err(ModelError::TooFewRows(1))
        ));
        assert!(matches!(
            ModelArtifact::fit(&features, &[1.0], "view_count", &small_params()),
            Err(ModelError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn save_and_load_preserve_predictions() {
        let (features, targets) = training_set();
        let artifact =
            ModelArtifact::fit(&features, &targets, "view_count", &small_params()).unwrap();
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("model.json");

        artifact.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();

        assert_eq!(loaded.encoder, artifact.encoder);
        assert_eq!(loaded.target, "view_count");
        assert_eq!(
            loaded.predict(&features).unwrap(),
            artifact.predict(&features).unwrap()
        );
    }

    #[test]
    fn refuses_other_format_versions() {
        let bytes = br#"{"format_version": 99}"#;
        assert!(matches!(
            ModelArtifact::from_slice(bytes),
            Err(ModelError::UnsupportedFormat {
                found: 99,
                expected: ARTIFACT_FORMAT_VERSION
            })
        ));
        assert!(matches!(
            ModelArtifact::from_slice(b"not json"),
            Err(ModelError::Serialization(_))
        ));
    }
}
