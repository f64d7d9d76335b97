use std::fs::File;
use std::path::Path;

use common::{EngineError, Observation, Result};
use normalize::{parse_observations, RawObservation};
use polars::prelude::*;
use serde::Deserialize;
use tracing::{info, warn};

/// Column names of the observation file, with the accepted alternatives.
const ENTITY_COLUMNS: [&str; 2] = ["unique_id", "entity_id"];
const TIMESTAMP_COLUMNS: [&str; 2] = ["ds", "timestamp"];
const VALUE_COLUMNS: [&str; 2] = ["y", "value"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Parquet,
}

impl InputFormat {
    /// Pick the reader from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(InputFormat::Csv),
            Some("parquet") | Some("pq") => Ok(InputFormat::Parquet),
            _ => Err(EngineError::ConfigError(format!(
                "unsupported file format: {}",
                path.display()
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CsvRecord {
    #[serde(alias = "entity_id")]
    unique_id: String,
    #[serde(alias = "timestamp")]
    ds: String,
    #[serde(alias = "value")]
    y: String,
}

/// Read observations from a CSV or Parquet file.
///
/// A blank value reads as 0. Rows with a non-numeric value or an
/// unparseable timestamp are dropped with a warning.
pub fn read_observations(path: &Path) -> Result<Vec<Observation>> {
    let format = InputFormat::from_path(path)?;
    let raw = match format {
        InputFormat::Csv => read_csv(path)?,
        InputFormat::Parquet => read_parquet(path)?,
    };
    let total = raw.len();
    let (observations, _) = parse_observations(raw);
    info!(
        path = %path.display(),
        format = ?format,
        rows = total,
        kept = observations.len(),
        "Observations loaded"
    );
    Ok(observations)
}

fn parse_value(entity_id: &str, raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(0.0);
    }
    match raw.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(entity = entity_id, value = raw, "Dropping row with non-numeric value");
            None
        }
    }
}

fn read_csv(path: &Path) -> Result<Vec<RawObservation>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<CsvRecord>() {
        let record = record?;
        if let Some(value) = parse_value(&record.unique_id, &record.y) {
            rows.push(RawObservation {
                entity_id: record.unique_id,
                timestamp: record.ds,
                value,
            });
        }
    }
    Ok(rows)
}

fn data_err(e: PolarsError) -> EngineError {
    EngineError::Data(e.to_string())
}

fn find_column<'a>(df: &'a DataFrame, names: &[&str]) -> Result<&'a Column> {
    names
        .iter()
        .find_map(|name| df.column(name).ok())
        .ok_or_else(|| {
            EngineError::InvalidInput(format!("missing column, expected one of {names:?}"))
        })
}

fn read_parquet(path: &Path) -> Result<Vec<RawObservation>> {
    let file = File::open(path)?;
    let df = ParquetReader::new(file).finish().map_err(data_err)?;

    let entities = find_column(&df, &ENTITY_COLUMNS)?
        .cast(&DataType::String)
        .map_err(data_err)?;
    let timestamps = find_column(&df, &TIMESTAMP_COLUMNS)?
        .cast(&DataType::String)
        .map_err(data_err)?;
    let values = find_column(&df, &VALUE_COLUMNS)?
        .cast(&DataType::Float64)
        .map_err(data_err)?;

    let entities = entities.as_materialized_series().str().map_err(data_err)?;
    let timestamps = timestamps.as_materialized_series().str().map_err(data_err)?;
    let values = values.as_materialized_series().f64().map_err(data_err)?;

    let mut rows = Vec::with_capacity(df.height());
    for ((entity, ts), value) in entities.into_iter().zip(timestamps).zip(values) {
        let (Some(entity), Some(ts)) = (entity, ts) else {
            warn!("Dropping parquet row with a missing id or timestamp");
            continue;
        };
        rows.push(RawObservation {
            entity_id: entity.to_string(),
            timestamp: ts.to_string(),
            value: value.unwrap_or(0.0),
        });
    }
    Ok(rows)
}
