//! Column layout of the model input: numeric passthrough followed by one-hot
//! blocks for the categorical columns.

use crate::features::{FeatureRecord, PipelineError, CATEGORY_ID, CHANNEL_TITLE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const CATEGORICAL_COLUMNS: &[&str] = &[CHANNEL_TITLE, CATEGORY_ID];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    /// Sorted vocabulary seen at fit time.
    pub categories: Vec<String>,
}

impl CategoricalColumn {
    fn position(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<CategoricalColumn>,
}

impl FeatureEncoder {
    /// Learns the layout from training records.
    ///
    /// Numeric columns are those every record carries, sorted by name.
    pub fn fit(records: &[FeatureRecord]) -> Self {
        let mut numeric: Option<BTreeSet<String>> = None;
        for record in records {
            let columns: BTreeSet<String> = record.numeric_columns().into_iter().collect();
            numeric = Some(match numeric {
                None => columns,
                Some(seen) => seen.intersection(&columns).cloned().collect(),
            });
        }

        let categorical_columns = CATEGORICAL_COLUMNS
            .iter()
            .map(|name| {
                let categories: BTreeSet<String> = records
                    .iter()
                    .map(|r| category_value(r, name))
                    .collect();
                CategoricalColumn {
                    name: name.to_string(),
                    categories: categories.into_iter().collect(),
                }
            })
            .collect();

        Self {
            numeric_columns: numeric.unwrap_or_default().into_iter().collect(),
            categorical_columns,
        }
    }

    /// Number of model inputs.
    pub fn width(&self) -> usize {
        self.numeric_columns.len()
            + self
                .categorical_columns
                .iter()
                .map(|c| c.categories.len())
                .sum::<usize>()
    }

    /// Encodes one record. Unknown categories leave their block all zeros.
    pub fn encode(&self, record: &FeatureRecord) -> Result<Vec<f32>, PipelineError> {
        let mut row = Vec::with_capacity(self.width());
        for column in &self.numeric_columns {
            let value = record
                .numeric_feature(column)
                .ok_or_else(|| PipelineError::missing(column))?;
            row.push(value as f32);
        }
        for column in &self.categorical_columns {
            let offset = row.len();
            row.resize(offset + column.categories.len(), 0.0);
            if let Some(position) = column.position(&category_value(record, &column.name)) {
                row[offset + position] = 1.0;
            }
        }
        Ok(row)
    }
}

fn category_value(record: &FeatureRecord, column: &str) -> String {
    match column {
        CATEGORY_ID => record.category_id.to_string(),
        _ => record.channel_title.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{NumericValue, LIKE_COUNT};
    use std::collections::BTreeMap;

    fn record(channel: &str, category_id: i64, likes: Option<i64>) -> FeatureRecord {
        let mut numeric = BTreeMap::new();
        if let Some(likes) = likes {
            numeric.insert(LIKE_COUNT.to_string(), NumericValue::Int(likes));
        }
        FeatureRecord {
            publish_day_of_week: 2,
            publish_hour: 10,
            duration_seconds: 60,
            tag_count: 3,
            category_id,
            channel_title: channel.to_string(),
            numeric,
        }
    }

    #[test]
    fn layout_is_numeric_then_one_hot() {
        let encoder = FeatureEncoder::fit(&[
            record("Beta", 10, Some(5)),
            record("Alpha", 22, Some(7)),
        ]);

        assert_eq!(
            encoder.numeric_columns,
            vec![
                "duration_seconds",
                "like_count",
                "publish_day_of_week",
                "publish_hour",
                "tag_count"
            ]
        );
        assert_eq!(encoder.categorical_columns[0].categories, vec!["Alpha", "Beta"]);
        assert_eq!(encoder.categorical_columns[1].categories, vec!["10", "22"]);
        assert_eq!(encoder.width(), 9);

        let row = encoder.encode(&record("Beta", 22, Some(5))).unwrap();
        assert_eq!(row, vec![60.0, 5.0, 2.0, 10.0, 3.0, 0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn unknown_categories_encode_as_zeros() {
        let encoder = FeatureEncoder::fit(&[record("Alpha", 10, Some(1))]);
        let row = encoder.encode(&record("Never Seen", 999, Some(1))).unwrap();
        assert_eq!(&row[row.len() - 2..], &[0.0, 0.0]);
    }

    #[test]
    fn only_shared_numeric_columns_are_kept() {
        let encoder = FeatureEncoder::fit(&[record("A", 1, Some(1)), record("B", 2, None)]);
        assert!(!encoder.numeric_columns.contains(&LIKE_COUNT.to_string()));
    }

    #[test]
    fn missing_numeric_column_is_a_schema_error() {
        let encoder = FeatureEncoder::fit(&[record("A", 1, Some(1))]);
        let err = encoder.encode(&record("A", 1, None)).unwrap_err();
        assert_eq!(err, PipelineError::missing(LIKE_COUNT));
    }
}
