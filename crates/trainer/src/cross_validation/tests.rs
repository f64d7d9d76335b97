use super::*;
use chrono::{NaiveDate, NaiveDateTime};
use common::{ErrorMetric, RunConfig, TimeLevel};

fn config(models: &[&str]) -> RunConfig {
    RunConfig {
        baseline_model: "Naive".into(),
        forecast_models: models.iter().map(|m| m.to_string()).collect(),
        forecast_period: 4,
        validation_period: 4,
        time_level: TimeLevel::Weekly,
        error_metric: ErrorMetric::Mape,
        fallback_model: None,
        num_windows: 2,
        prediction_level: None,
        window_size: None,
        workers: 2,
    }
}

fn week(i: usize) -> NaiveDateTime {
    let base = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    TimeLevel::Weekly.advance(base, i as u32).unwrap()
}

fn weekly_series(id: &str, values: Vec<f64>) -> Series {
    Series {
        entity_id: id.into(),
        timestamps: (0..values.len()).map(week).collect(),
        values,
    }
}

fn handles(cfg: &RunConfig) -> Vec<ModelHandle> {
    cfg.forecast_models
        .iter()
        .map(|name| ModelHandle::from_name(name, cfg).unwrap())
        .collect()
}

#[test]
fn test_short_entities_are_excluded() {
    let cfg = config(&["Naive"]);
    let models = handles(&cfg);
    let pool = WorkerPool::new(2).unwrap();
    let series = vec![
        weekly_series("A", (1..=52).map(f64::from).collect()),
        weekly_series("B", vec![1.0, 2.0, 3.0, 4.0]),
    ];

    let validator = CrossValidator::new(&models, None, 4, 2);
    assert_eq!(validator.min_length(), cfg.min_cv_length());
    let cv = validator.run(&pool, &series);

    assert_eq!(cv.excluded, vec!["B".to_string()]);
    assert!(cv.rows.iter().all(|r| r.entity_id == "A"));
    assert_eq!(cv.rows.len(), 8);
    assert_eq!(cv.models, vec!["Naive".to_string()]);
}

#[test]
fn test_minimum_length_is_inclusive() {
    let cfg = config(&["Naive"]);
    let models = handles(&cfg);
    let pool = WorkerPool::new(1).unwrap();
    let series = vec![
        weekly_series("exact", vec![1.0; 12]),
        weekly_series("short", vec![1.0; 11]),
    ];
    let cv = CrossValidator::new(&models, None, 4, 2).run(&pool, &series);
    assert_eq!(cv.excluded, vec!["short".to_string()]);
    assert_eq!(cv.rows.len(), 8);
}

#[test]
fn test_cutoff_is_last_training_timestamp() {
    let cfg = config(&["Naive"]);
    let models = handles(&cfg);
    let pool = WorkerPool::new(1).unwrap();
    let values: Vec<f64> = (1..=12).map(f64::from).collect();
    let cv = CrossValidator::new(&models, None, 4, 2).run(&pool, &[weekly_series("A", values)]);

    let first = &cv.rows[0];
    assert_eq!(first.cutoff, week(3));
    assert_eq!(first.timestamp, week(4));
    assert_eq!(first.actual, 5.0);
    assert_eq!(first.predictions, vec![Some(4.0)]);

    let last = cv.rows.last().unwrap();
    assert_eq!(last.cutoff, week(7));
    assert_eq!(last.timestamp, week(11));
    assert_eq!(last.actual, 12.0);
    assert_eq!(last.predictions, vec![Some(8.0)]);

    let cutoffs: std::collections::BTreeSet<_> = cv.rows.iter().map(|r| r.cutoff).collect();
    assert_eq!(cutoffs.len(), 2);
}

#[test]
fn test_step_size_moves_cutoffs() {
    let cfg = config(&["Naive"]);
    let models = handles(&cfg);
    let pool = WorkerPool::new(1).unwrap();
    let values: Vec<f64> = (0..12).map(f64::from).collect();
    let cv = CrossValidator::new(&models, None, 2, 3)
        .with_step_size(1)
        .run(&pool, &[weekly_series("A", values)]);

    let cutoffs: Vec<NaiveDateTime> = cv.rows.iter().step_by(2).map(|r| r.cutoff).collect();
    assert_eq!(cutoffs, vec![week(7), week(8), week(9)]);
}

#[test]
fn test_failed_fit_without_fallback_is_absent() {
    // SeasonalNaive needs a full year of weekly data.
    let cfg = config(&["Naive", "SeasonalNaive"]);
    let models = handles(&cfg);
    let pool = WorkerPool::new(1).unwrap();
    let values: Vec<f64> = (1..=12).map(f64::from).collect();
    let cv = CrossValidator::new(&models, None, 4, 2).run(&pool, &[weekly_series("A", values)]);
    assert!(cv.rows.iter().all(|r| r.predictions[0].is_some()));
    assert!(cv.rows.iter().all(|r| r.predictions[1].is_none()));
}

#[test]
fn test_failed_fit_uses_fallback() {
    let cfg = config(&["SeasonalNaive"]);
    let models = handles(&cfg);
    let fallback = ModelHandle::from_name("Historic Average", &cfg).unwrap();
    let pool = WorkerPool::new(1).unwrap();
    let values: Vec<f64> = (1..=12).map(f64::from).collect();
    let cv = CrossValidator::new(&models, Some(&fallback), 4, 2)
        .run(&pool, &[weekly_series("A", values)]);

    // First window trains on 1..=4, second on 1..=8.
    assert_eq!(cv.rows[0].predictions, vec![Some(2.5)]);
    assert_eq!(cv.rows[4].predictions, vec![Some(4.5)]);
}

#[test]
fn test_no_windows_means_no_rows() {
    let cfg = config(&["Naive"]);
    let models = handles(&cfg);
    let pool = WorkerPool::new(1).unwrap();
    let cv = CrossValidator::new(&models, None, 4, 0).run(&pool, &[weekly_series("A", vec![1.0; 20])]);
    assert!(cv.rows.is_empty());
    assert!(cv.excluded.is_empty());
}
