use super::*;

fn make_trend_seasonal(n: usize, m: usize) -> Vec<f64> {
    (0..n)
        .map(|i| {
            100.0 + 2.0 * i as f64 + 30.0 * (2.0 * std::f64::consts::PI * i as f64 / m as f64).sin()
        })
        .collect()
}

#[test]
fn test_initialize_additive_seasonal() {
    let values = vec![10.0, 20.0, 30.0, 40.0, 15.0, 25.0, 35.0, 45.0];
    let (state, start) = initial_state(&values, 4);

    assert_eq!(start, 4);
    // Trend = (30 - 25) / 4
    assert!((state.trend - 1.25).abs() < 1e-10);
    // Level = first-cycle mean 25 carried 1.5 periods along the trend
    assert!((state.level - 26.875).abs() < 1e-10);
    let expected = [-13.125, -4.375, 4.375, 13.125];
    for (s, e) in state.seasonal.iter().zip(expected) {
        assert!((s - e).abs() < 1e-10);
    }
}

#[test]
fn test_initialize_holt() {
    let (state, start) = initial_state(&[3.0, 5.0, 8.0], 1);
    assert_eq!(start, 1);
    assert!((state.level - 3.0).abs() < 1e-10);
    assert!((state.trend - 2.0).abs() < 1e-10);
}

#[test]
fn test_smooth_exact_line_has_no_error() {
    let values: Vec<f64> = (0..20).map(|i| 5.0 + 3.0 * i as f64).collect();
    let state = smooth(
        &values,
        1,
        Smoothing {
            alpha: 0.5,
            beta: 0.2,
            gamma: 0.0,
        },
    );
    assert!(state.sse < 1e-12);
    assert_eq!(state.steps, 19);
}

#[test]
fn test_holt_extrapolates_trend() {
    let values: Vec<f64> = (0..30).map(|i| 10.0 + 2.0 * i as f64).collect();
    let output = HoltWintersModel::new(1).fit_predict(&values, 3, None).unwrap();
    assert!((output.mean[0] - 70.0).abs() < 1e-6, "got {}", output.mean[0]);
    assert!((output.mean[2] - 74.0).abs() < 1e-6);
}

#[test]
fn test_seasonal_forecast_follows_pattern() {
    let m = 12;
    let values = make_trend_seasonal(72, m);
    let output = HoltWintersModel::new(m).fit_predict(&values, m, None).unwrap();
    let actual = make_trend_seasonal(72 + m, m);

    let mae: f64 = output
        .mean
        .iter()
        .zip(&actual[72..])
        .map(|(f, a)| (f - a).abs())
        .sum::<f64>()
        / m as f64;
    assert!(mae < 1.0, "MAE = {mae}");
}

#[test]
fn test_requires_two_seasons() {
    let values = make_trend_seasonal(20, 12);
    let err = HoltWintersModel::new(12).fit_predict(&values, 4, None).unwrap_err();
    assert!(matches!(err, EngineError::InsufficientData(_)));
}

#[test]
fn test_intervals_contain_point_and_widen() {
    let values: Vec<f64> = (0..40)
        .map(|i| 50.0 + i as f64 + if i % 2 == 0 { 3.0 } else { -3.0 })
        .collect();
    let output = HoltWintersModel::new(1).fit_predict(&values, 5, Some(90)).unwrap();
    let lower = output.lower.unwrap();
    let upper = output.upper.unwrap();
    for h in 0..5 {
        assert!(lower[h] <= output.mean[h] && output.mean[h] <= upper[h]);
    }
    assert!(upper[4] - lower[4] > upper[0] - lower[0]);
}
