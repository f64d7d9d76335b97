use super::*;
use chrono::NaiveDate;
use common::{ErrorMetric, RunConfig};

fn config(models: &[&str], fallback: Option<&str>) -> RunConfig {
    RunConfig {
        baseline_model: "Naive".into(),
        forecast_models: models.iter().map(|m| m.to_string()).collect(),
        forecast_period: 3,
        validation_period: 3,
        time_level: TimeLevel::Monthly,
        error_metric: ErrorMetric::Mape,
        fallback_model: fallback.map(String::from),
        num_windows: 2,
        prediction_level: None,
        window_size: None,
        workers: 2,
    }
}

fn month(year: i32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, m, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn monthly_series(id: &str, values: &[f64]) -> Series {
    let timestamps = (0..values.len())
        .map(|i| TimeLevel::Monthly.advance(month(2023, 1), i as u32).unwrap())
        .collect();
    Series {
        entity_id: id.into(),
        timestamps,
        values: values.to_vec(),
    }
}

fn handles(cfg: &RunConfig) -> Vec<ModelHandle> {
    cfg.forecast_models
        .iter()
        .map(|name| ModelHandle::from_name(name, cfg).unwrap())
        .collect()
}

#[test]
fn test_columns_follow_interval_support() {
    let cfg = config(&["Naive", "Croston"], None);
    let models = handles(&cfg);
    let runner = ForecastRunner::new(&models, None, 3, TimeLevel::Monthly).with_level(Some(90));
    let labels: Vec<String> = runner.columns().iter().map(|c| c.to_string()).collect();
    assert_eq!(labels, vec!["Naive", "Naive-lo-90", "Naive-hi-90", "CrostonClassic"]);

    let runner = ForecastRunner::new(&models, None, 3, TimeLevel::Monthly);
    assert_eq!(runner.columns().len(), 2);
}

#[test]
fn test_future_rows_per_entity() {
    let cfg = config(&["Naive", "Historic Average"], None);
    let models = handles(&cfg);
    let pool = WorkerPool::new(2).unwrap();
    let series = vec![
        monthly_series("A", &[1.0, 2.0, 3.0, 4.0]),
        monthly_series("B", &[10.0, 20.0]),
    ];

    let (frame, failures) = ForecastRunner::new(&models, None, 3, TimeLevel::Monthly).run(&pool, &series);
    assert!(failures.is_empty());
    assert_eq!(frame.len(), 6);

    let naive = ColumnKey::plain("Naive");
    let average = ColumnKey::plain("HistoricAverage");
    assert_eq!(frame.get("A", month(2023, 5), &naive), Some(4.0));
    assert_eq!(frame.get("A", month(2023, 7), &naive), Some(4.0));
    assert_eq!(frame.get("A", month(2023, 6), &average), Some(2.5));
    assert_eq!(frame.get("B", month(2023, 3), &average), Some(15.0));
    assert_eq!(frame.get("B", month(2023, 5), &naive), Some(20.0));
    assert_eq!(frame.get("A", month(2023, 4), &naive), None);
}

#[test]
fn test_failure_without_fallback_is_contained() {
    let cfg = config(&["Naive", "SeasonalNaive"], None);
    let models = handles(&cfg);
    let pool = WorkerPool::new(1).unwrap();
    let series = vec![monthly_series("C", &[5.0, 6.0, 7.0])];

    let (frame, failures) = ForecastRunner::new(&models, None, 2, TimeLevel::Monthly).run(&pool, &series);
    assert_eq!(frame.len(), 2);
    assert_eq!(frame.get("C", month(2023, 4), &ColumnKey::plain("Naive")), Some(7.0));
    assert_eq!(frame.get("C", month(2023, 4), &ColumnKey::plain("SeasonalNaive")), None);

    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].entity_id, "C");
    assert_eq!(failures[0].model, "SeasonalNaive");
    assert!(!failures[0].fallback_used);
}

#[test]
fn test_fallback_fills_failed_model() {
    let cfg = config(&["SeasonalNaive", "Naive"], Some("Historic Average"));
    let models = handles(&cfg);
    let fallback = ModelHandle::from_name("Historic Average", &cfg).unwrap();
    let pool = WorkerPool::new(2).unwrap();
    let series = vec![monthly_series("C", &[2.0, 4.0, 6.0])];

    let runner = ForecastRunner::new(&models, Some(&fallback), 2, TimeLevel::Monthly);
    let (frame, failures) = runner.run(&pool, &series);
    assert_eq!(frame.get("C", month(2023, 4), &ColumnKey::plain("SeasonalNaive")), Some(4.0));
    assert_eq!(frame.get("C", month(2023, 5), &ColumnKey::plain("SeasonalNaive")), Some(4.0));
    assert_eq!(frame.get("C", month(2023, 5), &ColumnKey::plain("Naive")), Some(6.0));
    assert_eq!(failures.len(), 1);
    assert!(failures[0].fallback_used);
}

#[test]
fn test_fallback_without_bounds_leaves_bounds_absent() {
    let cfg = config(&["SeasonalNaive"], Some("Croston"));
    let models = handles(&cfg);
    let fallback = ModelHandle::from_name("Croston", &cfg).unwrap();
    let pool = WorkerPool::new(1).unwrap();
    let series = vec![monthly_series("C", &[1.0, 0.0, 1.0])];

    let runner = ForecastRunner::new(&models, Some(&fallback), 1, TimeLevel::Monthly).with_level(Some(80));
    let (frame, _) = runner.run(&pool, &series);
    let ts = month(2023, 4);
    assert!(frame.get("C", ts, &ColumnKey::plain("SeasonalNaive")).is_some());
    assert_eq!(frame.get("C", ts, &ColumnKey::lo("SeasonalNaive", 80)), None);
    assert_eq!(frame.get("C", ts, &ColumnKey::hi("SeasonalNaive", 80)), None);
}

#[test]
fn test_intervals_written_when_level_set() {
    let cfg = config(&["Naive"], None);
    let models = handles(&cfg);
    let pool = WorkerPool::new(1).unwrap();
    let series = vec![monthly_series("A", &[1.0, 3.0, 2.0, 4.0, 3.0])];

    let runner = ForecastRunner::new(&models, None, 2, TimeLevel::Monthly).with_level(Some(90));
    let (frame, _) = runner.run(&pool, &series);
    let ts = month(2023, 6);
    let mean = frame.get("A", ts, &ColumnKey::plain("Naive")).unwrap();
    let lo = frame.get("A", ts, &ColumnKey::lo("Naive", 90)).unwrap();
    let hi = frame.get("A", ts, &ColumnKey::hi("Naive", 90)).unwrap();
    assert!(lo < mean && mean < hi);
    approx::assert_relative_eq!(mean - lo, hi - mean, epsilon = 1e-9);
}

#[test]
fn test_future_months_stay_on_month_ends() {
    let cfg = config(&["Naive"], None);
    let models = handles(&cfg);
    let jan_31 = NaiveDate::from_ymd_opt(2024, 1, 31)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    // Grid Jan 31, Feb 29, Mar 31, Apr 30; the last point is clamped.
    let timestamps: Vec<NaiveDateTime> = (0..4)
        .map(|i| TimeLevel::Monthly.advance(jan_31, i).unwrap())
        .collect();
    let series = Series {
        entity_id: "A".into(),
        timestamps,
        values: vec![1.0, 2.0, 3.0, 4.0],
    };

    let pool = WorkerPool::new(1).unwrap();
    let (frame, _) = ForecastRunner::new(&models, None, 3, TimeLevel::Monthly).run(&pool, &[series]);
    let future: Vec<NaiveDate> = frame.timestamps().iter().map(|ts| ts.date()).collect();
    assert_eq!(
        future,
        vec![
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            NaiveDate::from_ymd_opt(2024, 7, 31).unwrap(),
        ]
    );
}
