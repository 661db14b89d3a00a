use crate::features::RawRecord;
use anyhow::{Context, Result};
use serde_json::{Number, Value};
use std::io::Read;
use std::path::Path;

/// Reads a headed CSV file into raw records.
pub fn load_csv(path: &Path) -> Result<Vec<RawRecord>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open dataset: {:?}", path))?;
    read_csv(file).with_context(|| format!("Failed to read dataset: {:?}", path))
}

pub fn read_csv<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers().context("Missing CSV header row")?.clone();

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.with_context(|| format!("Malformed CSV row {}", index + 2))?;
        let record: RawRecord = headers
            .iter()
            .enumerate()
            .map(|(column, name)| (name.to_string(), cell_value(row.get(column).unwrap_or(""))))
            .collect();
        records.push(record);
    }
    Ok(records)
}

/// Empty cells are null, numeric cells are numbers, everything else is text.
pub fn cell_value(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::from(int);
    }
    if let Some(number) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    Value::String(cell.to_string())
}
