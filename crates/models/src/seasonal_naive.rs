use common::{EngineError, ForecastModel, ForecastOutput, Result};
use tracing::debug;

use crate::intervals::{gaussian_bounds, residual_sigma};

/// SeasonalNaive model: repeats the last seasonal cycle as forecast.
pub struct SeasonalNaiveModel {
    season_length: usize,
}

impl SeasonalNaiveModel {
    pub fn new(season_length: usize) -> Self {
        Self {
            season_length: season_length.max(1),
        }
    }
}

impl ForecastModel for SeasonalNaiveModel {
    fn name(&self) -> &str {
        "SeasonalNaive"
    }

    fn has_intervals(&self) -> bool {
        true
    }

    fn fit_predict(&self, values: &[f64], horizon: usize, level: Option<u8>) -> Result<ForecastOutput> {
        let n = values.len();
        let m = self.season_length;
        if n < m || n == 0 {
            return Err(EngineError::InsufficientData(format!(
                "SeasonalNaive requires a full season ({} points), got {}",
                m, n
            )));
        }

        debug!(period = m, horizon = horizon, "SeasonalNaive forecasting");

        let last_cycle = &values[n - m..];
        let mean: Vec<f64> = (0..horizon).map(|i| last_cycle[i % m]).collect();
        let output = ForecastOutput::point(self.name(), mean);

        let Some(level) = level else {
            return Ok(output);
        };

        let residuals: Vec<f64> = (m..n).map(|t| values[t] - values[t - m]).collect();
        let sigma = residual_sigma(&residuals, n - m);
        let sigmas: Vec<f64> = (1..=horizon)
            .map(|h| sigma * (((h - 1) / m + 1) as f64).sqrt())
            .collect();
        let (lower, upper) = gaussian_bounds(&output.mean, &sigmas, level)?;
        Ok(output.with_intervals(lower, upper))
    }
}
