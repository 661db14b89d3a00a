use thiserror::Error;

/// Errors raised while turning a raw record into a feature record.
///
/// Duration and tag parsing never fail; they resolve to 0 instead.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    #[error("{0}")]
    Schema(String),

    #[error("field {field}: cannot convert {value} to an integer")]
    TypeConversion { field: String, value: String },

    #[error("invalid published_date: {0}")]
    TemporalParse(String),
}

impl PipelineError {
    pub fn missing(field: &str) -> Self {
        Self::Schema(format!("missing required field: {field}"))
    }

    pub fn conversion(field: &str, value: &serde_json::Value) -> Self {
        Self::TypeConversion {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Short machine-friendly label, used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Schema(_) => "schema",
            Self::TypeConversion { .. } => "type_conversion",
            Self::TemporalParse(_) => "temporal_parse",
        }
    }
}
