use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Timelike};
use common::{Frame, Result};
use selector::Evaluation;
use serde_json::{json, Map, Value};
use tracing::info;

pub const FINAL_DATA_FILE: &str = "final_data.csv";
pub const EVALUATION_DATA_FILE: &str = "evaluation_data.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportFormat {
    /// One JSON document with `final_data` and `evaluation_data` arrays.
    Json(PathBuf),
    /// A directory holding one CSV per section.
    CsvDirectory(PathBuf),
}

impl ReportFormat {
    pub fn from_path(path: &Path) -> Self {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            ReportFormat::Json(path.to_path_buf())
        } else {
            ReportFormat::CsvDirectory(path.to_path_buf())
        }
    }
}

/// Dates at midnight print without a time of day.
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    if ts.num_seconds_from_midnight() == 0 && ts.nanosecond() == 0 {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn json_number(value: Option<f64>) -> Value {
    value.map_or(Value::Null, |v| json!(v))
}

/// Write the "Final Data" and "Evaluation Data" sections to `path`.
pub fn write_report(path: &Path, final_data: &Frame, evaluation: &Evaluation) -> Result<ReportFormat> {
    let format = ReportFormat::from_path(path);
    match &format {
        ReportFormat::Json(file) => write_json(file, final_data, evaluation)?,
        ReportFormat::CsvDirectory(dir) => {
            fs::create_dir_all(dir)?;
            write_final_csv(&dir.join(FINAL_DATA_FILE), final_data)?;
            write_evaluation_csv(&dir.join(EVALUATION_DATA_FILE), evaluation)?;
        }
    }
    info!(
        path = %path.display(),
        rows = final_data.len(),
        entities = evaluation.records.len(),
        "Report written"
    );
    Ok(format)
}

fn write_final_csv(path: &Path, frame: &Frame) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["unique_id".to_string(), "ds".to_string()];
    header.extend(frame.columns().iter().map(|c| c.to_string()));
    writer.write_record(&header)?;

    for ((entity, ts), cells) in frame.rows() {
        let mut record = vec![entity.clone(), format_timestamp(*ts)];
        record.extend(cells.iter().map(|v| cell(*v)));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_evaluation_csv(path: &Path, evaluation: &Evaluation) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["unique_id".to_string()];
    header.extend(evaluation.models.iter().cloned());
    header.push("best_model".to_string());
    writer.write_record(&header)?;

    for record in &evaluation.records {
        let mut row = vec![record.entity_id.clone()];
        row.extend(record.scores.iter().map(|s| cell(*s)));
        row.push(record.best_model.clone().unwrap_or_default());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json(path: &Path, frame: &Frame, evaluation: &Evaluation) -> Result<()> {
    let labels: Vec<String> = frame.columns().iter().map(|c| c.to_string()).collect();
    let final_data: Vec<Value> = frame
        .rows()
        .map(|((entity, ts), cells)| {
            let mut row = Map::new();
            row.insert("unique_id".into(), json!(entity));
            row.insert("ds".into(), json!(format_timestamp(*ts)));
            for (label, value) in labels.iter().zip(cells) {
                row.insert(label.clone(), json_number(*value));
            }
            Value::Object(row)
        })
        .collect();

    let evaluation_data: Vec<Value> = evaluation
        .records
        .iter()
        .map(|record| {
            let mut row = Map::new();
            row.insert("unique_id".into(), json!(record.entity_id));
            for (model, score) in evaluation.models.iter().zip(&record.scores) {
                row.insert(model.clone(), json_number(*score));
            }
            row.insert("best_model".into(), json!(record.best_model));
            Value::Object(row)
        })
        .collect();

    let document = json!({
        "final_data": final_data,
        "evaluation_data": evaluation_data,
    });
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(&document)?)?;
    Ok(())
}
