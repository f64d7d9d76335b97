use crate::config::ErrorMetric;

/// Compute Mean Squared Error.
pub fn mse(forecast: &[f64], actual: &[f64]) -> f64 {
    assert_eq!(forecast.len(), actual.len());
    if forecast.is_empty() {
        return f64::NAN;
    }
    forecast
        .iter()
        .zip(actual)
        .map(|(f, a)| (a - f).powi(2))
        .sum::<f64>()
        / forecast.len() as f64
}

/// Compute Root Mean Squared Error.
pub fn rmse(forecast: &[f64], actual: &[f64]) -> f64 {
    mse(forecast, actual).sqrt()
}

/// Compute Mean Absolute Percentage Error as a fraction (0.15 = 15%).
///
/// Periods with a zero actual have no defined percentage error and are
/// skipped; if every actual is zero the result is NaN.
pub fn mape(forecast: &[f64], actual: &[f64]) -> f64 {
    assert_eq!(forecast.len(), actual.len());
    let (sum, count) = forecast
        .iter()
        .zip(actual)
        .filter(|(_, a)| **a != 0.0)
        .fold((0.0, 0usize), |(sum, count), (f, a)| {
            (sum + ((a - f) / a).abs(), count + 1)
        });
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

impl ErrorMetric {
    /// Score one backtest window. NaN means the window carries no information.
    pub fn score(self, forecast: &[f64], actual: &[f64]) -> f64 {
        match self {
            ErrorMetric::Mse => mse(forecast, actual),
            ErrorMetric::Rmse => rmse(forecast, actual),
            ErrorMetric::Mape => mape(forecast, actual),
        }
    }
}
