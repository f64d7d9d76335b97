//! Mean-based models: the full-history average and a trailing window average.

use common::{EngineError, ForecastModel, ForecastOutput, Result};
use tracing::debug;

use crate::intervals::{gaussian_bounds, residual_sigma};

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub struct HistoricAverageModel;

impl ForecastModel for HistoricAverageModel {
    fn name(&self) -> &str {
        "HistoricAverage"
    }

    fn has_intervals(&self) -> bool {
        true
    }

    fn fit_predict(&self, values: &[f64], horizon: usize, level: Option<u8>) -> Result<ForecastOutput> {
        if values.is_empty() {
            return Err(EngineError::InsufficientData(
                "HistoricAverage requires at least 1 data point".into(),
            ));
        }

        let n = values.len();
        let avg = mean(values);
        let output = ForecastOutput::point(self.name(), vec![avg; horizon]);

        let Some(level) = level else {
            return Ok(output);
        };

        let residuals: Vec<f64> = values.iter().map(|v| v - avg).collect();
        let sigma = residual_sigma(&residuals, n - 1) * (1.0 + 1.0 / n as f64).sqrt();
        let (lower, upper) = gaussian_bounds(&output.mean, &vec![sigma; horizon], level)?;
        Ok(output.with_intervals(lower, upper))
    }
}

/// Average of the last `window_size` observations. Point forecasts only.
pub struct WindowAverageModel {
    window_size: usize,
}

impl WindowAverageModel {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
        }
    }
}

impl ForecastModel for WindowAverageModel {
    fn name(&self) -> &str {
        "WindowAverage"
    }

    fn has_intervals(&self) -> bool {
        false
    }

    fn fit_predict(&self, values: &[f64], horizon: usize, _level: Option<u8>) -> Result<ForecastOutput> {
        let n = values.len();
        if n < self.window_size {
            return Err(EngineError::InsufficientData(format!(
                "WindowAverage requires {} points, got {}",
                self.window_size, n
            )));
        }

        debug!(window = self.window_size, horizon = horizon, "WindowAverage forecasting");

        let avg = mean(&values[n - self.window_size..]);
        Ok(ForecastOutput::point(self.name(), vec![avg; horizon]))
    }
}
