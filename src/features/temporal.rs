//! Publish timestamp parsing.
//!
//! Weekday and hour are read in whatever offset the timestamp is written in;
//! nothing is converted to UTC or to the local zone.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde_json::Value;

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishTime {
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: u8,
    /// 0..=23
    pub hour: u8,
}

impl PublishTime {
    fn from_parts<T: Datelike + Timelike>(t: &T) -> Self {
        Self {
            day_of_week: t.weekday().num_days_from_monday() as u8,
            hour: t.hour() as u8,
        }
    }
}

pub fn parse_publish_time(input: &str) -> Option<PublishTime> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(PublishTime::from_parts(&dt));
    }

    let with_offset = match input.strip_suffix('Z').or_else(|| input.strip_suffix('z')) {
        Some(stripped) => format!("{stripped}+00:00"),
        None => input.to_string(),
    };
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&with_offset, format) {
            return Some(PublishTime::from_parts(&dt));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input, format) {
            return Some(PublishTime::from_parts(&dt));
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| PublishTime::from_parts(&dt))
}

/// Parses a raw field value; only strings can hold a timestamp.
pub fn publish_time(value: &Value) -> Option<PublishTime> {
    match value {
        Value::String(s) => parse_publish_time(s),
        _ => None,
    }
}
