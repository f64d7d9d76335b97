use common::{EngineError, ForecastModel, ForecastOutput, Result};
use tracing::debug;

use crate::intervals::{gaussian_bounds, residual_sigma};

/// Naive model: every future period repeats the last observation.
#[derive(Debug, Clone, Default)]
pub struct NaiveModel;

impl NaiveModel {
    pub fn new() -> Self {
        Self
    }
}

impl ForecastModel for NaiveModel {
    fn name(&self) -> &str {
        "Naive"
    }

    fn has_intervals(&self) -> bool {
        true
    }

    fn fit_predict(&self, values: &[f64], horizon: usize, level: Option<u8>) -> Result<ForecastOutput> {
        let Some(&last) = values.last() else {
            return Err(EngineError::InsufficientData(
                "Naive requires at least 1 data point".into(),
            ));
        };

        debug!(horizon = horizon, data_length = values.len(), "Naive forecasting");

        let mean = vec![last; horizon];
        let output = ForecastOutput::point(self.name(), mean);

        let Some(level) = level else {
            return Ok(output);
        };

        // One-step residuals of a random walk are the first differences.
        let diffs: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();
        let sigma = residual_sigma(&diffs, values.len() - 1);
        let sigmas: Vec<f64> = (1..=horizon).map(|h| sigma * (h as f64).sqrt()).collect();
        let (lower, upper) = gaussian_bounds(&output.mean, &sigmas, level)?;
        Ok(output.with_intervals(lower, upper))
    }
}
