//! Synthetic inputs shared by the criterion benches.

use chrono::{NaiveDate, NaiveDateTime};
use common::{ErrorMetric, Observation, RunConfig, Series, TimeLevel};

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Trend plus a sine season of `period` points, shifted per entity.
pub fn trend_seasonal(n: usize, period: usize, phase: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = (i + phase) as f64;
            100.0 + 1.5 * i as f64 + 30.0 * (2.0 * std::f64::consts::PI * t / period as f64).sin()
        })
        .collect()
}

/// Dense monthly series for `entities` ids.
pub fn monthly_series(entities: usize, n: usize) -> Vec<Series> {
    (0..entities)
        .map(|e| Series {
            entity_id: format!("item-{e:04}"),
            timestamps: (0..n)
                .filter_map(|i| TimeLevel::Monthly.advance(start(), i as u32))
                .collect(),
            values: trend_seasonal(n, 12, e),
        })
        .collect()
}

/// Raw daily observations with every `gap_every`-th day missing.
pub fn daily_observations(entities: usize, n: usize, gap_every: usize) -> Vec<Observation> {
    let mut observations = Vec::with_capacity(entities * n);
    for e in 0..entities {
        let values = trend_seasonal(n, 7, e);
        for (i, v) in values.into_iter().enumerate() {
            if gap_every > 0 && i % gap_every == gap_every - 1 {
                continue;
            }
            if let Some(ts) = TimeLevel::Daily.advance(start(), i as u32) {
                observations.push(Observation::new(format!("item-{e:04}"), ts, v));
            }
        }
    }
    observations
}

pub fn monthly_config(models: &[&str]) -> RunConfig {
    RunConfig {
        baseline_model: "Naive".into(),
        forecast_models: models.iter().map(|m| m.to_string()).collect(),
        forecast_period: 12,
        validation_period: 6,
        time_level: TimeLevel::Monthly,
        error_metric: ErrorMetric::Mape,
        fallback_model: Some("Historic Average".into()),
        num_windows: 3,
        prediction_level: None,
        window_size: None,
        workers: 0,
    }
}
