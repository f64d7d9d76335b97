use std::slice;
use std::time::Instant;

use common::{EngineError, Frame, Observation, Result, RunConfig};
use models::ModelSet;
use normalize::fill_time_grid;
use selector::{evaluate, selection_summary, Evaluation};
use tracing::{info, info_span, warn};
use trainer::{CrossValidator, ForecastFailure, ForecastRunner, WorkerPool};

use crate::comparator::compare_with_baseline;
use crate::projector::project_best;
use crate::report::{assemble_final_data, history_frame};

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// History, per-model forecasts, best-model forecast and baseline.
    pub final_data: Frame,
    /// Averaged backtest errors and the winning model per entity.
    pub evaluation: Evaluation,
    /// Entities won by each model, fewest first.
    pub summary: Vec<(String, usize)>,
    /// Candidate and baseline failures, with fallback substitution noted.
    pub failures: Vec<ForecastFailure>,
    /// Entities too short to be cross-validated.
    pub excluded: Vec<String>,
}

/// Run the whole engine on already parsed observations.
///
/// Pipeline: resolve models → fill time grid → forecast candidates and
/// baseline → cross-validate → evaluate → project best model → compare with
/// baseline → assemble the final report.
///
/// Only configuration problems (and an empty input) fail the run; model
/// failures are contained per entity and reported in [`RunOutcome::failures`].
pub fn run(config: &RunConfig, observations: &[Observation]) -> Result<RunOutcome> {
    let start = Instant::now();
    config.validate()?;
    let models = ModelSet::from_config(config)?;
    let pool = WorkerPool::new(config.workers)?;

    if observations.is_empty() {
        return Err(EngineError::InsufficientData("no observations to forecast".into()));
    }

    info!(
        observations = observations.len(),
        models = ?models.candidate_aliases(),
        baseline = models.baseline.alias(),
        horizon = config.forecast_period,
        time_level = ?config.time_level,
        threads = pool.threads(),
        "Starting forecasting run"
    );

    let series = {
        let _span = info_span!("normalize").entered();
        fill_time_grid(observations, config.time_level)
    };

    let fallback = models.fallback.as_ref();
    let (forecasts, mut failures) = {
        let _span = info_span!("forecast").entered();
        ForecastRunner::new(&models.candidates, fallback, config.forecast_period, config.time_level)
            .with_level(config.prediction_level)
            .run(&pool, &series)
    };

    let (baseline, baseline_failures) = {
        let _span = info_span!("baseline").entered();
        ForecastRunner::new(
            slice::from_ref(&models.baseline),
            None,
            config.forecast_period,
            config.time_level,
        )
        .with_level(config.prediction_level)
        .run(&pool, &series)
    };
    failures.extend(baseline_failures);

    let cross_validation = {
        let _span = info_span!("cross_validation").entered();
        CrossValidator::new(&models.candidates, fallback, config.validation_period, config.num_windows)
            .run(&pool, &series)
    };

    let evaluation = evaluate(
        &cross_validation.rows,
        &cross_validation.models,
        config.error_metric,
    );
    let summary = selection_summary(&evaluation);
    for (model, count) in &summary {
        info!(model = %model, entities = count, "Best model count");
    }

    let projected = project_best(&forecasts, &evaluation);
    let comparison = compare_with_baseline(&projected, &baseline);
    let final_data = assemble_final_data(&history_frame(&series), &forecasts, &comparison);

    if !failures.is_empty() {
        warn!(
            failures = failures.len(),
            substituted = failures.iter().filter(|f| f.fallback_used).count(),
            "Some forecasts failed"
        );
    }

    info!(
        entities = series.len(),
        evaluated = evaluation.records.len(),
        excluded = cross_validation.excluded.len(),
        rows = final_data.len(),
        elapsed = format!("{:.2}s", start.elapsed().as_secs_f64()),
        "Forecasting run complete"
    );

    Ok(RunOutcome {
        final_data,
        evaluation,
        summary,
        failures,
        excluded: cross_validation.excluded,
    })
}
