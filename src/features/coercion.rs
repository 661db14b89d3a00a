//! Integer coercion for count and id columns.

use super::PipelineError;
use serde_json::Value;

/// Casts a field value to an integer.
///
/// Floats are truncated toward zero. Strings are trimmed and may hold either
/// an integer or an integral float (`"10"`, `" 10 "`, `"10.0"`).
pub fn coerce_integer(field: &str, value: &Value) -> Result<i64, PipelineError> {
    match value {
        Value::Number(number) => {
            if let Some(n) = number.as_i64() {
                return Ok(n);
            }
            match number.as_f64() {
                Some(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Ok(f.trunc() as i64),
                _ => Err(PipelineError::conversion(field, value)),
            }
        }
        Value::String(s) => parse_integer_str(s).ok_or_else(|| PipelineError::conversion(field, value)),
        _ => Err(PipelineError::conversion(field, value)),
    }
}

fn parse_integer_str(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(n);
    }
    let f = trimmed.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
