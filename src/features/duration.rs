//! ISO-8601 style `PT#H#M#S` durations.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    // Anchored at the start only: trailing text after a valid prefix is ignored.
    static ref DURATION_PATTERN: Regex =
        Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?")
            .expect("Failed to compile duration pattern");
}

/// Total seconds of a duration string, or 0 when it does not match.
pub fn parse_duration_seconds(duration: &str) -> u64 {
    let Some(captures) = DURATION_PATTERN.captures(duration) else {
        return 0;
    };

    let mut components = [0u64; 3];
    for (slot, group) in components.iter_mut().zip(1..=3) {
        if let Some(m) = captures.get(group) {
            match m.as_str().parse::<u64>() {
                Ok(n) => *slot = n,
                Err(_) => return 0,
            }
        }
    }

    let [hours, minutes, seconds] = components;
    hours
        .checked_mul(3600)
        .and_then(|h| minutes.checked_mul(60).and_then(|m| h.checked_add(m)))
        .and_then(|hm| hm.checked_add(seconds))
        .unwrap_or(0)
}

/// Duration feature for a raw field value; anything but a string yields 0.
pub fn duration_seconds(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::String(s)) => parse_duration_seconds(s),
        _ => 0,
    }
}
