use std::time::Instant;

use chrono::NaiveDateTime;
use common::{ColumnKey, ForecastModel, ForecastOutput, Frame, Series, TimeLevel};
use models::ModelHandle;
use tracing::{debug, info, warn};

use crate::WorkerPool;

/// A candidate that could not forecast one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastFailure {
    pub entity_id: String,
    pub model: String,
    pub error: String,
    /// True if the fallback model filled the gap.
    pub fallback_used: bool,
}

/// Forecasts every entity with every model over the future horizon.
pub struct ForecastRunner<'a> {
    models: &'a [ModelHandle],
    fallback: Option<&'a ModelHandle>,
    horizon: usize,
    time_level: TimeLevel,
    level: Option<u8>,
}

/// Cells for one entity, produced on a worker and merged afterwards.
struct EntityForecast {
    timestamps: Vec<NaiveDateTime>,
    cells: Vec<(usize, usize, f64)>,
    failures: Vec<ForecastFailure>,
}

impl<'a> ForecastRunner<'a> {
    pub fn new(
        models: &'a [ModelHandle],
        fallback: Option<&'a ModelHandle>,
        horizon: usize,
        time_level: TimeLevel,
    ) -> Self {
        Self {
            models,
            fallback,
            horizon,
            time_level,
            level: None,
        }
    }

    /// Emit `<model>-lo-<level>` / `<model>-hi-<level>` for models with interval support.
    pub fn with_level(mut self, level: Option<u8>) -> Self {
        self.level = level;
        self
    }

    /// Output columns: each model's point forecast followed by its bounds.
    pub fn columns(&self) -> Vec<ColumnKey> {
        let mut columns = Vec::new();
        for model in self.models {
            columns.push(ColumnKey::plain(model.alias()));
            if let Some(level) = self.interval_level(model) {
                columns.push(ColumnKey::lo(model.alias(), level));
                columns.push(ColumnKey::hi(model.alias(), level));
            }
        }
        columns
    }

    fn interval_level(&self, model: &ModelHandle) -> Option<u8> {
        self.level.filter(|_| model.has_intervals())
    }

    pub fn run(&self, pool: &WorkerPool, series: &[Series]) -> (Frame, Vec<ForecastFailure>) {
        let start = Instant::now();
        let columns = self.columns();
        let per_entity = pool.map(series, |s| self.forecast_entity(s, &columns));

        let mut frame = Frame::new(columns);
        let mut failures = Vec::new();
        for (s, entity) in series.iter().zip(per_entity) {
            for ts in &entity.timestamps {
                frame.touch(&s.entity_id, *ts);
            }
            for (step, col, value) in entity.cells {
                frame.set(&s.entity_id, entity.timestamps[step], col, value);
            }
            failures.extend(entity.failures);
        }

        info!(
            entities = series.len(),
            models = self.models.len(),
            horizon = self.horizon,
            rows = frame.len(),
            failures = failures.len(),
            elapsed = format!("{:.2}s", start.elapsed().as_secs_f64()),
            "Forecasting complete"
        );
        (frame, failures)
    }

    fn forecast_entity(&self, series: &Series, columns: &[ColumnKey]) -> EntityForecast {
        let mut result = EntityForecast {
            timestamps: Vec::new(),
            cells: Vec::new(),
            failures: Vec::new(),
        };

        let Some(&anchor) = series.timestamps.first() else {
            warn!(entity = %series.entity_id, "Empty series, nothing to forecast");
            return result;
        };
        // Counted from the grid anchor so month-end series stay on month ends.
        let offset = series.timestamps.len() - 1;
        let timestamps: Option<Vec<NaiveDateTime>> = (1..=self.horizon)
            .map(|k| self.time_level.advance(anchor, u32::try_from(offset + k).ok()?))
            .collect();
        let Some(timestamps) = timestamps else {
            warn!(entity = %series.entity_id, "Forecast horizon runs past the calendar range");
            return result;
        };
        result.timestamps = timestamps;

        let mut fallback_output: Option<Option<ForecastOutput>> = None;
        for model in self.models {
            let output = match model.fit_predict(&series.values, self.horizon, self.level) {
                Ok(output) => output,
                Err(e) => {
                    let substitute = fallback_output
                        .get_or_insert_with(|| self.run_fallback(series))
                        .clone();
                    warn!(
                        entity = %series.entity_id,
                        model = model.alias(),
                        error = %e,
                        fallback = substitute.is_some(),
                        "Model failed"
                    );
                    result.failures.push(ForecastFailure {
                        entity_id: series.entity_id.clone(),
                        model: model.alias().to_string(),
                        error: e.to_string(),
                        fallback_used: substitute.is_some(),
                    });
                    match substitute {
                        Some(output) => output,
                        None => continue,
                    }
                }
            };
            self.write_cells(model, &output, columns, &mut result.cells);
        }
        result
    }

    fn run_fallback(&self, series: &Series) -> Option<ForecastOutput> {
        let fallback = self.fallback?;
        match fallback.fit_predict(&series.values, self.horizon, self.level) {
            Ok(output) => {
                debug!(entity = %series.entity_id, fallback = fallback.alias(), "Fallback forecast ready");
                Some(output)
            }
            Err(e) => {
                warn!(
                    entity = %series.entity_id,
                    fallback = fallback.alias(),
                    error = %e,
                    "Fallback model failed"
                );
                None
            }
        }
    }

    /// Write `output` under `model`'s columns. Bounds the output lacks stay absent.
    fn write_cells(
        &self,
        model: &ModelHandle,
        output: &ForecastOutput,
        columns: &[ColumnKey],
        cells: &mut Vec<(usize, usize, f64)>,
    ) {
        let mut put = |key: ColumnKey, values: &[f64]| {
            if let Some(col) = columns.iter().position(|c| *c == key) {
                cells.extend(values.iter().enumerate().map(|(step, v)| (step, col, *v)));
            }
        };
        put(ColumnKey::plain(model.alias()), &output.mean);
        if let Some(level) = self.interval_level(model) {
            if let (Some(lower), Some(upper)) = (&output.lower, &output.upper) {
                put(ColumnKey::lo(model.alias(), level), lower);
                put(ColumnKey::hi(model.alias(), level), upper);
            }
        }
    }
}

#[cfg(test)]
mod tests;
