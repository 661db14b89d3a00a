use super::literal::parse_literal;
use serde_json::Value;

/// Number of tags in a serialized tag list, 0 when it cannot be read as one.
pub fn count_tags_str(tags: &str) -> u64 {
    parse_literal(tags.trim())
        .ok()
        .and_then(|literal| literal.sequence_len())
        .unwrap_or(0) as u64
}

/// Tag count for a raw field value. A JSON array (already-parsed request
/// bodies) counts its elements directly.
pub fn tag_count(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::String(s)) => count_tags_str(s),
        Some(Value::Array(items)) => items.len() as u64,
        _ => 0,
    }
}
