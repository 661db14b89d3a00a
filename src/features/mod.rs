//! Feature engineering shared by training and serving.
//!
//! A raw record is one flat JSON object describing a video. [`transform`]
//! turns a batch of them into [`FeatureRecord`]s: unused columns are pruned,
//! counts and `category_id` are cast to integers, the publish timestamp is
//! reduced to weekday and hour, the duration string to seconds and the tag
//! list to its length. Training batches silently drop rows whose timestamp
//! cannot be parsed; inference batches fail instead.

mod coercion;
mod duration;
mod error;
mod literal;
mod tags;
mod temporal;

pub use coercion::coerce_integer;
pub use duration::{duration_seconds, parse_duration_seconds};
pub use error::PipelineError;
pub use literal::{parse_literal, Literal, LiteralError};
pub use tags::{count_tags_str, tag_count};
pub use temporal::{parse_publish_time, publish_time, PublishTime};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// One unprocessed video metadata row.
pub type RawRecord = Map<String, Value>;

pub const VIEW_COUNT: &str = "view_count";
pub const LIKE_COUNT: &str = "like_count";
pub const COMMENT_COUNT: &str = "comment_count";
pub const CATEGORY_ID: &str = "category_id";
pub const CHANNEL_TITLE: &str = "channel_title";
pub const PUBLISHED_DATE: &str = "published_date";
pub const DURATION: &str = "duration";
pub const TAGS: &str = "tags";

pub const PUBLISH_DAY_OF_WEEK: &str = "publish_day_of_week";
pub const PUBLISH_HOUR: &str = "publish_hour";
pub const DURATION_SECONDS: &str = "duration_seconds";
pub const TAG_COUNT: &str = "tag_count";

/// Columns with no predictive value.
pub const PRUNED_COLUMNS: &[&str] = &["video_id", "description", "thumbnail", "title"];

/// Counts cast to integers when training.
pub const TRAINING_COUNT_COLUMNS: &[&str] = &[VIEW_COUNT, LIKE_COUNT, COMMENT_COUNT];

/// Columns consumed by the pipeline itself; never copied through as-is.
const ENGINEERED_COLUMNS: &[&str] = &[
    CATEGORY_ID,
    CHANNEL_TITLE,
    PUBLISHED_DATE,
    DURATION,
    TAGS,
    PUBLISH_DAY_OF_WEEK,
    PUBLISH_HOUR,
    DURATION_SECONDS,
    TAG_COUNT,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// Batch over a dataset; rows with an unusable timestamp are dropped.
    Training,
    /// Single request; an unusable timestamp is an error.
    Inference,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericValue {
    Int(i64),
    Float(f64),
}

impl NumericValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            NumericValue::Int(n) => n as f64,
            NumericValue::Float(f) => f,
        }
    }

    fn from_json(value: &Value) -> Option<Self> {
        let Value::Number(number) = value else {
            return None;
        };
        match number.as_i64() {
            Some(n) => Some(NumericValue::Int(n)),
            None => number.as_f64().map(NumericValue::Float),
        }
    }
}

/// Model-ready row derived from a [`RawRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub publish_day_of_week: u8,
    pub publish_hour: u8,
    pub duration_seconds: u64,
    pub tag_count: u64,
    pub category_id: i64,
    pub channel_title: String,
    /// Every other numeric column, including the coerced counts.
    #[serde(flatten)]
    pub numeric: BTreeMap<String, NumericValue>,
}

impl FeatureRecord {
    /// Looks up a numeric feature by column name.
    pub fn numeric_feature(&self, name: &str) -> Option<f64> {
        match name {
            PUBLISH_DAY_OF_WEEK => Some(self.publish_day_of_week as f64),
            PUBLISH_HOUR => Some(self.publish_hour as f64),
            DURATION_SECONDS => Some(self.duration_seconds as f64),
            TAG_COUNT => Some(self.tag_count as f64),
            _ => self.numeric.get(name).map(NumericValue::as_f64),
        }
    }

    /// Names of every numeric feature this record carries.
    pub fn numeric_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = [PUBLISH_DAY_OF_WEEK, PUBLISH_HOUR, DURATION_SECONDS, TAG_COUNT]
            .iter()
            .map(|s| s.to_string())
            .collect();
        columns.extend(self.numeric.keys().cloned());
        columns
    }

    /// Removes and returns the training target.
    pub fn take_target(&mut self, target: &str) -> Option<f64> {
        self.numeric.remove(target).map(|v| v.as_f64())
    }
}

/// Result of a batch run.
#[derive(Debug, Default)]
pub struct BatchOutput {
    pub records: Vec<FeatureRecord>,
    /// Rows dropped because their timestamp could not be parsed.
    pub dropped: usize,
}

/// Applies the pipeline to a batch of raw records.
pub fn transform(
    raw_records: &[RawRecord],
    mode: PipelineMode,
) -> Result<Vec<FeatureRecord>, PipelineError> {
    transform_batch(raw_records, mode).map(|out| out.records)
}

/// Same as [`transform`], also reporting how many rows were dropped.
pub fn transform_batch(
    raw_records: &[RawRecord],
    mode: PipelineMode,
) -> Result<BatchOutput, PipelineError> {
    let mut output = BatchOutput {
        records: Vec::with_capacity(raw_records.len()),
        dropped: 0,
    };
    for raw in raw_records {
        match engineer(raw, mode)? {
            Some(record) => output.records.push(record),
            None => output.dropped += 1,
        }
    }
    if output.dropped > 0 {
        debug!(
            "Dropped {} of {} rows with unparseable {} or null categoricals",
            output.dropped,
            raw_records.len(),
            PUBLISHED_DATE
        );
    }
    Ok(output)
}

/// Single-row inference helper.
pub fn transform_one(raw: &RawRecord) -> Result<FeatureRecord, PipelineError> {
    engineer(raw, PipelineMode::Inference)?
        .ok_or_else(|| PipelineError::TemporalParse("no timestamp".to_string()))
}

/// Returns `Ok(None)` for a training row that has to be dropped.
fn engineer(raw: &RawRecord, mode: PipelineMode) -> Result<Option<FeatureRecord>, PipelineError> {
    check_required(raw, mode)?;

    let mut numeric = BTreeMap::new();
    if mode == PipelineMode::Training {
        for column in TRAINING_COUNT_COLUMNS {
            let value = coerce_integer(column, required(raw, column)?)?;
            numeric.insert(column.to_string(), NumericValue::Int(value));
        }
        // Empty categorical cells drop the row; inference still rejects them.
        if let Some(column) = [CATEGORY_ID, CHANNEL_TITLE]
            .into_iter()
            .find(|column| raw.get(*column).is_some_and(Value::is_null))
        {
            debug!("Dropping training row with null {}", column);
            return Ok(None);
        }
    }
    let category_id = coerce_integer(CATEGORY_ID, required(raw, CATEGORY_ID)?)?;
    let channel_title = categorical_text(CHANNEL_TITLE, required(raw, CHANNEL_TITLE)?)?;

    let publish = match resolve_publish_time(raw, mode)? {
        Some(publish) => publish,
        None => return Ok(None),
    };

    let duration_seconds = match (raw.get(DURATION), raw.get(DURATION_SECONDS)) {
        (None, Some(given)) => non_negative(given).unwrap_or(0),
        (value, _) => duration::duration_seconds(value),
    };
    let tag_count = match (raw.get(TAGS), raw.get(TAG_COUNT)) {
        (None, Some(given)) => non_negative(given).unwrap_or(0),
        (value, _) => tags::tag_count(value),
    };

    for (name, value) in raw {
        if PRUNED_COLUMNS.contains(&name.as_str())
            || ENGINEERED_COLUMNS.contains(&name.as_str())
            || numeric.contains_key(name)
        {
            continue;
        }
        if let Some(number) = NumericValue::from_json(value) {
            numeric.insert(name.clone(), number);
        }
    }

    Ok(Some(FeatureRecord {
        publish_day_of_week: publish.day_of_week,
        publish_hour: publish.hour,
        duration_seconds,
        tag_count,
        category_id,
        channel_title,
        numeric,
    }))
}

fn check_required(raw: &RawRecord, mode: PipelineMode) -> Result<(), PipelineError> {
    let mut required_columns = vec![CATEGORY_ID, CHANNEL_TITLE];
    if mode == PipelineMode::Training {
        required_columns.extend_from_slice(TRAINING_COUNT_COLUMNS);
        required_columns.push(PUBLISHED_DATE);
    }
    for column in required_columns {
        if !raw.contains_key(column) {
            return Err(PipelineError::missing(column));
        }
    }
    Ok(())
}

fn required<'a>(raw: &'a RawRecord, column: &str) -> Result<&'a Value, PipelineError> {
    match raw.get(column) {
        None | Some(Value::Null) => Err(PipelineError::missing(column)),
        Some(value) => Ok(value),
    }
}

fn categorical_text(column: &str, value: &Value) -> Result<String, PipelineError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(PipelineError::Schema(format!("field {column} must be text"))),
    }
}

fn resolve_publish_time(
    raw: &RawRecord,
    mode: PipelineMode,
) -> Result<Option<PublishTime>, PipelineError> {
    match (raw.get(PUBLISHED_DATE), mode) {
        (Some(value), _) => match temporal::publish_time(value) {
            Some(publish) => Ok(Some(publish)),
            None if mode == PipelineMode::Training => Ok(None),
            None => Err(PipelineError::TemporalParse(display_value(value))),
        },
        // Training rows always carry the column (checked above).
        (None, PipelineMode::Training) => Ok(None),
        (None, PipelineMode::Inference) => pre_engineered_publish_time(raw)
            .map(Some)
            .ok_or_else(|| PipelineError::TemporalParse("missing".to_string())),
    }
}

/// Records that already carry weekday and hour (e.g. built by a form).
fn pre_engineered_publish_time(raw: &RawRecord) -> Option<PublishTime> {
    let day_of_week = raw.get(PUBLISH_DAY_OF_WEEK).and_then(non_negative)?;
    let hour = raw.get(PUBLISH_HOUR).and_then(non_negative)?;
    if day_of_week > 6 || hour > 23 {
        return None;
    }
    Some(PublishTime {
        day_of_week: day_of_week as u8,
        hour: hour as u8,
    })
}

fn non_negative(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}
