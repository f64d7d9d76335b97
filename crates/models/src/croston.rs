use common::{EngineError, ForecastModel, ForecastOutput, Result};
use tracing::debug;

const ALPHA: f64 = 0.1;

/// Classic Croston method for intermittent demand.
///
/// Smooths non-zero demand sizes and the gaps between them separately and
/// forecasts their ratio as a flat demand rate.
pub struct CrostonClassicModel;

/// Level of simple exponential smoothing after the last observation,
/// initialised at the first one.
fn ses_level(values: &[f64], alpha: f64) -> f64 {
    values
        .iter()
        .skip(1)
        .fold(values[0], |level, &y| alpha * y + (1.0 - alpha) * level)
}

/// Non-zero demand sizes and the number of periods since the previous demand.
fn demand_and_intervals(values: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut sizes = Vec::new();
    let mut intervals = Vec::new();
    let mut previous = 0usize;
    for (i, &y) in values.iter().enumerate() {
        if y != 0.0 {
            sizes.push(y);
            intervals.push((i + 1 - previous) as f64);
            previous = i + 1;
        }
    }
    (sizes, intervals)
}

impl ForecastModel for CrostonClassicModel {
    fn name(&self) -> &str {
        "CrostonClassic"
    }

    fn has_intervals(&self) -> bool {
        false
    }

    fn fit_predict(&self, values: &[f64], horizon: usize, _level: Option<u8>) -> Result<ForecastOutput> {
        if values.is_empty() {
            return Err(EngineError::InsufficientData(
                "Croston requires at least 1 data point".into(),
            ));
        }

        let (sizes, intervals) = demand_and_intervals(values);
        if sizes.is_empty() {
            debug!("Croston: no demand in history, forecasting zero");
            return Ok(ForecastOutput::point(self.name(), vec![0.0; horizon]));
        }

        let size = ses_level(&sizes, ALPHA);
        let interval = ses_level(&intervals, ALPHA);
        debug!(
            demands = sizes.len(),
            size = format!("{:.4}", size),
            interval = format!("{:.4}", interval),
            "Croston fitted"
        );

        Ok(ForecastOutput::point(self.name(), vec![size / interval; horizon]))
    }
}
