use common::{EngineError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Two-sided standard normal quantile for a `level`% interval.
pub(crate) fn z_score(level: u8) -> Result<f64> {
    let normal = Normal::new(0.0, 1.0).map_err(|e| EngineError::ModelError(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + f64::from(level) / 200.0))
}

/// Residual scale `sqrt(sum(r^2) / normalizer)`, ignoring non-finite residuals.
pub(crate) fn residual_sigma(residuals: &[f64], normalizer: usize) -> f64 {
    if normalizer == 0 {
        return 0.0;
    }
    let ss: f64 = residuals
        .iter()
        .filter(|r| r.is_finite())
        .map(|r| r * r)
        .sum();
    (ss / normalizer as f64).sqrt()
}

/// `mean ± z * sigma_h` for each forecast step.
pub(crate) fn gaussian_bounds(
    mean: &[f64],
    sigmas: &[f64],
    level: u8,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let z = z_score(level)?;
    let lower = mean.iter().zip(sigmas).map(|(m, s)| m - z * s).collect();
    let upper = mean.iter().zip(sigmas).map(|(m, s)| m + z * s).collect();
    Ok((lower, upper))
}
