use augurs::prelude::*;
use common::{EngineError, ForecastModel, ForecastOutput, Result};
use tracing::debug;

/// Automatic ETS model selection, wrapping augurs AutoETS.
///
/// Error and trend components are chosen automatically; the model is fitted
/// without a seasonal component ("ZZN").
pub struct AutoEtsModel;

const SPEC: &str = "ZZN";

impl ForecastModel for AutoEtsModel {
    fn name(&self) -> &str {
        "AutoETS"
    }

    fn has_intervals(&self) -> bool {
        true
    }

    fn fit_predict(&self, values: &[f64], horizon: usize, level: Option<u8>) -> Result<ForecastOutput> {
        if values.len() < 3 {
            return Err(EngineError::InsufficientData(
                "AutoETS requires at least 3 data points".into(),
            ));
        }

        debug!(
            spec = SPEC,
            horizon = horizon,
            data_length = values.len(),
            "AutoETS fitting"
        );

        let auto = augurs::ets::AutoETS::new(1, SPEC)
            .map_err(|e| EngineError::ModelError(format!("AutoETS init: {e}")))?;

        let fitted = auto
            .fit(values)
            .map_err(|e| EngineError::ModelError(format!("AutoETS fit: {e}")))?;

        let forecast = fitted
            .predict(horizon, level.map(|l| f64::from(l) / 100.0))
            .map_err(|e| EngineError::ModelError(format!("AutoETS predict: {e}")))?;

        let output = ForecastOutput::point(self.name(), forecast.point);
        Ok(match forecast.intervals {
            Some(iv) if level.is_some() => output.with_intervals(iv.lower, iv.upper),
            _ => output,
        })
    }
}

#[cfg(test)]
mod tests;
