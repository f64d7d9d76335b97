use std::path::Path;

use common::{EngineError, Result, RunConfig};
use tracing::info;

/// Read a two-column `Parameters,Values` CSV into a run configuration.
pub fn read_config(path: &Path) -> Result<RunConfig> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let key_idx = headers.iter().position(|h| h == "Parameters");
    let value_idx = headers.iter().position(|h| h == "Values");
    let (Some(key_idx), Some(value_idx)) = (key_idx, value_idx) else {
        return Err(EngineError::ConfigError(format!(
            "{} must have 'Parameters' and 'Values' columns",
            path.display()
        )));
    };

    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record?;
        let key = record.get(key_idx).unwrap_or_default().to_string();
        let value = record.get(value_idx).unwrap_or_default().to_string();
        pairs.push((key, value));
    }

    let config = RunConfig::from_pairs(pairs)?;
    info!(
        path = %path.display(),
        models = ?config.forecast_models,
        baseline = %config.baseline_model,
        metric = config.error_metric.label(),
        "Configuration loaded"
    );
    Ok(config)
}
