use std::fmt;
use std::str::FromStr;

use chrono::{Months, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{EngineError, Result};

/// Calendar granularity of every series in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeLevel {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl TimeLevel {
    /// Number of periods in one seasonal cycle.
    pub fn season_length(self) -> usize {
        match self {
            TimeLevel::Hourly => 24,
            TimeLevel::Daily => 365,
            TimeLevel::Weekly => 52,
            TimeLevel::Monthly => 12,
            TimeLevel::Yearly => 1,
        }
    }

    /// Timestamp `steps` periods after `anchor`.
    ///
    /// Calendar levels are always computed from the anchor, so a series
    /// anchored on Jan 31 yields Feb 29, Mar 31, ... rather than drifting to
    /// the 29th.
    pub fn advance(self, anchor: NaiveDateTime, steps: u32) -> Option<NaiveDateTime> {
        match self {
            TimeLevel::Hourly => anchor.checked_add_signed(TimeDelta::hours(steps as i64)),
            TimeLevel::Daily => anchor.checked_add_signed(TimeDelta::days(steps as i64)),
            TimeLevel::Weekly => anchor.checked_add_signed(TimeDelta::weeks(steps as i64)),
            TimeLevel::Monthly => anchor.checked_add_months(Months::new(steps)),
            TimeLevel::Yearly => anchor.checked_add_months(Months::new(steps.checked_mul(12)?)),
        }
    }
}

impl FromStr for TimeLevel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Hourly" => Ok(TimeLevel::Hourly),
            "Daily" => Ok(TimeLevel::Daily),
            "Weekly" => Ok(TimeLevel::Weekly),
            "Monthly" => Ok(TimeLevel::Monthly),
            "Yearly" => Ok(TimeLevel::Yearly),
            other => Err(EngineError::ConfigError(format!(
                "unknown forecast time level '{other}' (expected Hourly, Daily, Weekly, Monthly or Yearly)"
            ))),
        }
    }
}

/// Closed set of error metrics the evaluator can rank models by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorMetric {
    Mse,
    Rmse,
    Mape,
}

impl ErrorMetric {
    pub fn label(self) -> &'static str {
        match self {
            ErrorMetric::Mse => "mse",
            ErrorMetric::Rmse => "rmse",
            ErrorMetric::Mape => "mape",
        }
    }
}

impl FromStr for ErrorMetric {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "MSE" => Ok(ErrorMetric::Mse),
            "RMSE" => Ok(ErrorMetric::Rmse),
            "MAPE" => Ok(ErrorMetric::Mape),
            other => Err(EngineError::ConfigError(format!(
                "unknown error metric '{other}' (expected MSE, RMSE or MAPE)"
            ))),
        }
    }
}

impl fmt::Display for ErrorMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Key-value configuration exactly as it appears in the configuration sheet.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    #[serde(rename = "Baseline models")]
    pub baseline_model: String,
    #[serde(rename = "Forecasting models")]
    pub forecast_models: String,
    #[serde(rename = "Forecasting period")]
    pub forecast_period: String,
    #[serde(rename = "Validation period")]
    pub validation_period: String,
    #[serde(rename = "Forecast Time level")]
    pub time_level: String,
    #[serde(rename = "Error metric")]
    pub error_metric: String,
    #[serde(rename = "Fallback model", default)]
    pub fallback_model: Option<String>,
    #[serde(rename = "Number of Crossvalidation")]
    pub num_windows: String,
    #[serde(rename = "Prediction level", default)]
    pub prediction_level: Option<String>,
    #[serde(rename = "Window size", default)]
    pub window_size: Option<String>,
    #[serde(rename = "Workers", default)]
    pub workers: Option<String>,
}

const KNOWN_KEYS: [&str; 11] = [
    "Baseline models",
    "Forecasting models",
    "Forecasting period",
    "Validation period",
    "Forecast Time level",
    "Error metric",
    "Fallback model",
    "Number of Crossvalidation",
    "Prediction level",
    "Window size",
    "Workers",
];

/// Immutable run configuration shared by every stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunConfig {
    pub baseline_model: String,
    pub forecast_models: Vec<String>,
    pub forecast_period: usize,
    pub validation_period: usize,
    pub time_level: TimeLevel,
    pub error_metric: ErrorMetric,
    pub fallback_model: Option<String>,
    pub num_windows: usize,
    /// Prediction interval level in percent (e.g. 90).
    pub prediction_level: Option<u8>,
    pub window_size: Option<usize>,
    /// Worker pool size; 0 lets the pool pick one thread per CPU.
    pub workers: usize,
}

impl RunConfig {
    /// Build from a key-value list such as the rows of the configuration sheet.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = serde_json::Map::new();
        for (key, value) in pairs {
            let key: String = key.into();
            let key = key.trim().to_string();
            if key.is_empty() {
                continue;
            }
            if !KNOWN_KEYS.contains(&key.as_str()) {
                warn!(key = %key, "Ignoring unknown configuration key");
                continue;
            }
            map.insert(key, serde_json::Value::String(value.into()));
        }

        let raw: RawConfig = serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| EngineError::ConfigError(e.to_string()))?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawConfig) -> Result<Self> {
        let forecast_models: Vec<String> = raw
            .forecast_models
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();

        let fallback_model = raw
            .fallback_model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        let prediction_level = match non_blank(raw.prediction_level) {
            Some(v) => {
                let level = parse_count("Prediction level", &v)?;
                Some(u8::try_from(level).map_err(|_| {
                    EngineError::ConfigError(format!("Prediction level must be below 100, got {level}"))
                })?)
            }
            None => None,
        };

        let config = Self {
            baseline_model: raw.baseline_model.trim().to_string(),
            forecast_models,
            forecast_period: parse_count("Forecasting period", &raw.forecast_period)?,
            validation_period: parse_count("Validation period", &raw.validation_period)?,
            time_level: raw.time_level.parse()?,
            error_metric: raw.error_metric.parse()?,
            fallback_model,
            num_windows: parse_count("Number of Crossvalidation", &raw.num_windows)?,
            prediction_level,
            window_size: non_blank(raw.window_size)
                .map(|v| parse_count("Window size", &v))
                .transpose()?,
            workers: non_blank(raw.workers)
                .map(|v| parse_count("Workers", &v))
                .transpose()?
                .unwrap_or(0),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.baseline_model.is_empty() {
            return Err(EngineError::ConfigError("Baseline models must name a model".into()));
        }
        if self.forecast_models.is_empty() {
            return Err(EngineError::ConfigError(
                "Forecasting models must list at least one model".into(),
            ));
        }
        if self.forecast_period == 0 {
            return Err(EngineError::ConfigError("Forecasting period must be positive".into()));
        }
        if self.validation_period == 0 {
            return Err(EngineError::ConfigError("Validation period must be positive".into()));
        }
        if let Some(level) = self.prediction_level {
            if level == 0 || level >= 100 {
                return Err(EngineError::ConfigError(format!(
                    "Prediction level must be between 1 and 99, got {level}"
                )));
            }
        }
        if self.window_size == Some(0) {
            return Err(EngineError::ConfigError("Window size must be positive".into()));
        }
        Ok(())
    }

    pub fn season_length(&self) -> usize {
        self.time_level.season_length()
    }

    /// Window of the moving-average model; the season length unless overridden.
    pub fn window_size(&self) -> usize {
        self.window_size.unwrap_or_else(|| self.season_length())
    }

    /// Minimum series length for an entity to take part in cross-validation.
    pub fn min_cv_length(&self) -> usize {
        self.validation_period * (self.num_windows + 1)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse a non-negative integer, accepting integral floats such as "12.0"
/// that spreadsheet exports produce.
fn parse_count(key: &str, value: &str) -> Result<usize> {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<usize>() {
        return Ok(n);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => Ok(f as usize),
        _ => Err(EngineError::ConfigError(format!(
            "{key} must be a non-negative integer, got '{trimmed}'"
        ))),
    }
}
