use std::time::Instant;

use common::{CrossValidationRow, ForecastModel, Series};
use models::{rolling_train_lengths, ModelHandle, WindowForecast};
use tracing::{debug, info, warn};

use crate::WorkerPool;

/// Backtest rows of a run, with the entities too short to take part.
#[derive(Debug, Clone, Default)]
pub struct CrossValidation {
    /// Model aliases, in the order of every row's `predictions`.
    pub models: Vec<String>,
    pub rows: Vec<CrossValidationRow>,
    pub excluded: Vec<String>,
}

/// Rolling-origin backtests: `n_windows` folds of `horizon` periods, the
/// newest ending at the last observation, cutoffs `step_size` apart.
pub struct CrossValidator<'a> {
    models: &'a [ModelHandle],
    fallback: Option<&'a ModelHandle>,
    horizon: usize,
    step_size: usize,
    n_windows: usize,
}

impl<'a> CrossValidator<'a> {
    pub fn new(
        models: &'a [ModelHandle],
        fallback: Option<&'a ModelHandle>,
        horizon: usize,
        n_windows: usize,
    ) -> Self {
        Self {
            models,
            fallback,
            horizon,
            step_size: horizon,
            n_windows,
        }
    }

    pub fn with_step_size(mut self, step_size: usize) -> Self {
        self.step_size = step_size;
        self
    }

    /// Shortest history an entity needs to be backtested.
    pub fn min_length(&self) -> usize {
        self.horizon * (self.n_windows + 1)
    }

    pub fn run(&self, pool: &WorkerPool, series: &[Series]) -> CrossValidation {
        let start = Instant::now();
        let min_length = self.min_length();
        let (eligible, short): (Vec<&Series>, Vec<&Series>) =
            series.iter().partition(|s| s.len() >= min_length);

        let excluded: Vec<String> = short.iter().map(|s| s.entity_id.clone()).collect();
        if !excluded.is_empty() {
            warn!(
                count = excluded.len(),
                min_length,
                "Entities too short for cross-validation are excluded from evaluation"
            );
            debug!(entities = ?excluded, "Excluded from cross-validation");
        }

        let rows: Vec<CrossValidationRow> = pool
            .map(&eligible, |s| self.backtest(s))
            .into_iter()
            .flatten()
            .collect();

        info!(
            entities = eligible.len(),
            excluded = excluded.len(),
            windows = self.n_windows,
            rows = rows.len(),
            elapsed = format!("{:.2}s", start.elapsed().as_secs_f64()),
            "Cross-validation complete"
        );

        CrossValidation {
            models: self.models.iter().map(|m| m.alias().to_string()).collect(),
            rows,
            excluded,
        }
    }

    /// Backtest one entity. Rows are ordered by cutoff, then timestamp.
    fn backtest(&self, series: &Series) -> Vec<CrossValidationRow> {
        let per_model: Vec<Vec<WindowForecast>> = self
            .models
            .iter()
            .map(|model| {
                model.cross_validate(&series.values, self.horizon, self.step_size, self.n_windows, None)
            })
            .collect();
        let train_lengths =
            rolling_train_lengths(series.len(), self.horizon, self.step_size, self.n_windows);

        let mut rows = Vec::with_capacity(train_lengths.len() * self.horizon);
        for (window, &train_len) in train_lengths.iter().enumerate() {
            let history = &series.values[..train_len];
            let cutoff = series.timestamps[train_len - 1];
            let steps = self.horizon.min(series.len() - train_len);

            let mut fallback: Option<Option<Vec<f64>>> = None;
            let predictions: Vec<Option<Vec<f64>>> = self
                .models
                .iter()
                .zip(&per_model)
                .map(|(model, windows)| match windows.get(window).map(|w| &w.result) {
                    Some(Ok(output)) => Some(output.mean.clone()),
                    Some(Err(e)) => {
                        debug!(
                            entity = %series.entity_id,
                            model = model.alias(),
                            cutoff = %cutoff,
                            error = %e,
                            "Backtest fit failed"
                        );
                        fallback
                            .get_or_insert_with(|| self.fallback_mean(history))
                            .clone()
                    }
                    None => None,
                })
                .collect();

            for step in 0..steps {
                let t = train_len + step;
                rows.push(CrossValidationRow {
                    entity_id: series.entity_id.clone(),
                    timestamp: series.timestamps[t],
                    cutoff,
                    actual: series.values[t],
                    predictions: predictions
                        .iter()
                        .map(|p| p.as_ref().map(|mean| mean[step]))
                        .collect(),
                });
            }
        }
        rows
    }

    fn fallback_mean(&self, history: &[f64]) -> Option<Vec<f64>> {
        self.fallback?
            .fit_predict(history, self.horizon, None)
            .map(|output| output.mean)
            .ok()
    }
}

#[cfg(test)]
mod tests;
