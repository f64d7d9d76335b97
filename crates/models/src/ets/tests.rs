use super::*;

/// Deterministic LCG noise in [-amplitude, amplitude].
fn lcg_noise(seed: u64, n: usize, amplitude: f64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let frac = ((state >> 33) as f64) / ((1u64 << 31) as f64);
            (frac * 2.0 - 1.0) * amplitude
        })
        .collect()
}

#[test]
fn test_ets_linear_trend() {
    let values: Vec<f64> = (0..50).map(|i| 10.0 + i as f64 * 2.0).collect();
    let output = AutoEtsModel.fit_predict(&values, 5, None).unwrap();
    assert_eq!(output.mean.len(), 5);
    assert_eq!(output.model_name, "AutoETS");
    // Should predict increasing values
    assert!(output.mean[0] > values.last().copied().unwrap_or(0.0) - 10.0);
    assert!(output.lower.is_none());
}

#[test]
fn test_ets_intervals_when_requested() {
    let noise = lcg_noise(7, 60, 3.0);
    let values: Vec<f64> = noise.iter().map(|e| 100.0 + e).collect();
    let output = AutoEtsModel.fit_predict(&values, 6, Some(90)).unwrap();
    let lower = output.lower.unwrap();
    let upper = output.upper.unwrap();
    assert_eq!(lower.len(), 6);
    for h in 0..6 {
        assert!(lower[h] < output.mean[h] && output.mean[h] < upper[h]);
    }
}

#[test]
fn test_ets_insufficient_data() {
    let result = AutoEtsModel.fit_predict(&[1.0, 2.0], 3, None);
    assert!(matches!(result, Err(EngineError::InsufficientData(_))));
}

#[test]
fn test_ets_constant_series() {
    let values = vec![100.0; 30];
    let output = AutoEtsModel.fit_predict(&values, 5, None).unwrap();
    assert_eq!(output.mean.len(), 5);
    for v in &output.mean {
        assert!((*v - 100.0).abs() < 10.0, "Expected ~100, got {}", v);
    }
}

#[test]
fn test_ets_noisy_level_tracks_mean() {
    let noise = lcg_noise(42, 150, 10.0);
    let values: Vec<f64> = noise.iter().map(|e| 300.0 + e).collect();
    let output = AutoEtsModel.fit_predict(&values, 10, None).unwrap();
    for v in &output.mean {
        assert!((*v - 300.0).abs() < 8.0, "Expected ~300, got {}", v);
    }
}
