use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Trait that all forecast models must implement.
pub trait ForecastModel: Send + Sync {
    /// Column label of the model in forecast output.
    fn name(&self) -> &str;

    /// Whether `fit_predict` can produce prediction intervals.
    fn has_intervals(&self) -> bool;

    /// Fit on the provided history and forecast `horizon` periods ahead.
    ///
    /// `level` is the prediction interval level in percent; models without
    /// interval support ignore it.
    fn fit_predict(
        &self,
        values: &[f64],
        horizon: usize,
        level: Option<u8>,
    ) -> crate::Result<ForecastOutput>;
}

/// Output of a forecast model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastOutput {
    /// Point forecast (mean).
    pub mean: Vec<f64>,
    /// Lower bound of the prediction interval.
    pub lower: Option<Vec<f64>>,
    /// Upper bound of the prediction interval.
    pub upper: Option<Vec<f64>>,
    /// Name of the model that produced this forecast.
    pub model_name: String,
}

impl ForecastOutput {
    pub fn point(model_name: impl Into<String>, mean: Vec<f64>) -> Self {
        Self {
            mean,
            lower: None,
            upper: None,
            model_name: model_name.into(),
        }
    }

    pub fn with_intervals(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.lower = Some(lower);
        self.upper = Some(upper);
        self
    }

    /// True if every point and bound is a finite number.
    pub fn is_finite(&self) -> bool {
        let finite = |v: &[f64]| v.iter().all(|x| x.is_finite());
        finite(&self.mean)
            && self.lower.as_deref().map_or(true, finite)
            && self.upper.as_deref().map_or(true, finite)
    }
}

/// One raw input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub entity_id: String,
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Observation {
    pub fn new(entity_id: impl Into<String>, timestamp: NaiveDateTime, value: f64) -> Self {
        Self {
            entity_id: entity_id.into(),
            timestamp,
            value,
        }
    }
}

/// Dense, evenly spaced history of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub entity_id: String,
    pub timestamps: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamps.last().copied()
    }
}

/// Realized value and per-model predictions for one period of one backtest window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationRow {
    pub entity_id: String,
    pub timestamp: NaiveDateTime,
    /// Last timestamp of the training window.
    pub cutoff: NaiveDateTime,
    pub actual: f64,
    /// One cell per model, in run order; `None` when no forecast was produced.
    pub predictions: Vec<Option<f64>>,
}
