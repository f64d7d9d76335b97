use super::*;

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

fn manual_fit(d: usize, intercept: f64, ar: Vec<f64>, ma: Vec<f64>, residuals: Vec<f64>) -> FittedArima {
    FittedArima {
        order: Order {
            p: ar.len(),
            d,
            q: ma.len(),
        },
        intercept,
        ar,
        ma,
        residuals,
        sigma2: 1.0,
        aicc: 0.0,
    }
}

#[test]
fn test_difference_orders() {
    let values = [1.0, 2.0, 4.0, 7.0];
    assert_eq!(difference(&values, 0), values.to_vec());
    assert_eq!(difference(&values, 1), vec![1.0, 2.0, 3.0]);
    assert_eq!(difference(&values, 2), vec![1.0, 1.0]);
}

#[test]
fn test_kpss_separates_noise_from_trend() {
    let noise = lcg_noise(11, 100, 1.0);
    assert!(kpss_statistic(&noise) < KPSS_CRITICAL);

    let trend: Vec<f64> = (0..100).map(|i| i as f64 + noise[i]).collect();
    assert!(kpss_statistic(&trend) > KPSS_CRITICAL);
}

#[test]
fn test_constant_series_needs_no_differencing() {
    assert_eq!(kpss_statistic(&[3.0; 20]), 0.0);
    assert_eq!(choose_differencing(&[3.0; 20]), 0);
}

#[test]
fn test_trend_is_differenced() {
    let values: Vec<f64> = (0..60).map(|i| 5.0 + 2.0 * i as f64).collect();
    assert_eq!(choose_differencing(&values), 1);
}

#[test]
fn test_integration_of_forecasts() {
    let values = [1.0, 2.0, 4.0, 7.0];

    let fit = manual_fit(1, 0.0, vec![], vec![], vec![0.0; 3]);
    assert_eq!(forecast_mean(&values, &fit, 2), vec![7.0, 7.0]);

    let fit = manual_fit(2, 0.0, vec![], vec![], vec![0.0; 2]);
    assert_eq!(forecast_mean(&values, &fit, 2), vec![10.0, 13.0]);
}

#[test]
fn test_psi_weights() {
    let ar1 = manual_fit(0, 0.0, vec![0.5], vec![], vec![]);
    let psi = psi_weights(&ar1, 4);
    for (j, w) in psi.iter().enumerate() {
        assert!((w - 0.5f64.powi(j as i32)).abs() < 1e-12);
    }

    let random_walk = manual_fit(1, 0.0, vec![], vec![], vec![]);
    assert_eq!(psi_weights(&random_walk, 3), vec![1.0, 1.0, 1.0]);

    let ma1 = manual_fit(0, 0.0, vec![], vec![0.4], vec![]);
    assert_eq!(psi_weights(&ma1, 3), vec![1.0, 0.4, 0.0]);
}

#[test]
fn test_linear_trend_extrapolated() {
    let values: Vec<f64> = (0..40).map(|i| 10.0 + 3.0 * i as f64).collect();
    let output = AutoArimaModel.fit_predict(&values, 3, None).unwrap();
    assert_eq!(output.model_name, "AutoARIMA");
    for (h, v) in output.mean.iter().enumerate() {
        let expected = 10.0 + 3.0 * (40 + h) as f64;
        assert!((v - expected).abs() < 1e-3, "h={h}: {v} vs {expected}");
    }
}

#[test]
fn test_ar_process_reverts_to_mean() {
    let noise = lcg_noise(1, 200, 1.0);
    let mut values = vec![50.0];
    for e in &noise[1..] {
        let prev = *values.last().unwrap();
        values.push(50.0 + 0.7 * (prev - 50.0) + e);
    }
    let output = AutoArimaModel.fit_predict(&values, 30, Some(95)).unwrap();
    let last = *output.mean.last().unwrap();
    assert!((last - 50.0).abs() < 2.0, "long-run forecast {last}");

    let lower = output.lower.unwrap();
    let upper = output.upper.unwrap();
    assert!(upper[29] - lower[29] >= upper[0] - lower[0]);
}

#[test]
fn test_too_short() {
    assert!(matches!(
        AutoArimaModel.fit_predict(&[1.0, 2.0, 3.0], 2, None),
        Err(EngineError::InsufficientData(_))
    ));
}
