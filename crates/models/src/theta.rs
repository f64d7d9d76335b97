//! Dynamic optimised theta model.
//!
//! The deseasonalised series is tracked by a simple-exponential-smoothing
//! level plus a linear trend whose intercept and slope are re-estimated at
//! every step. Smoothing weight, theta and the initial level are chosen by
//! minimising the in-sample one-step MSE.

use common::{EngineError, ForecastModel, ForecastOutput, Result};
use tracing::debug;

use crate::intervals::{gaussian_bounds, z_score};
use crate::optim::{self, Bounds, Settings};

pub struct DynamicThetaModel {
    season_length: usize,
}

impl DynamicThetaModel {
    pub fn new(season_length: usize) -> Self {
        Self {
            season_length: season_length.max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decomposition {
    Additive,
    Multiplicative,
}

#[derive(Debug, Clone, Copy)]
struct ThetaParams {
    alpha: f64,
    theta: f64,
    level0: f64,
}

#[derive(Debug, Clone, Copy)]
struct ThetaState {
    level: f64,
    meany: f64,
    an: f64,
    bn: f64,
}

// ---------------------------------------------------------------------------
// Seasonality
// ---------------------------------------------------------------------------

fn acf(values: &[f64], max_lag: usize) -> Vec<f64> {
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let denom: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (1..=max_lag)
        .map(|lag| {
            if lag >= n || denom < 1e-12 {
                return 0.0;
            }
            (0..n - lag)
                .map(|t| (values[t] - mean) * (values[t + lag] - mean))
                .sum::<f64>()
                / denom
        })
        .collect()
}

/// Significance test of the autocorrelation at lag `m` (90% two-sided).
fn is_seasonal(values: &[f64], m: usize) -> Result<bool> {
    if m < 4 || values.len() < 2 * m {
        return Ok(false);
    }
    let r = acf(values, m);
    let r_sq: f64 = r[..m - 1].iter().map(|x| x * x).sum();
    let stat = ((1.0 + 2.0 * r_sq) / values.len() as f64).sqrt();
    Ok(r[m - 1].abs() / stat > z_score(90)?)
}

/// Seasonal indices by classical decomposition (centred moving average).
fn seasonal_indices(values: &[f64], m: usize, kind: Decomposition) -> Vec<f64> {
    let n = values.len();
    let half = m / 2;
    let mut sums = vec![0.0; m];
    let mut counts = vec![0usize; m];

    for t in half..n - half {
        let trend = if m % 2 == 0 {
            (0.5 * values[t - half]
                + values[t - half + 1..t + half].iter().sum::<f64>()
                + 0.5 * values[t + half])
                / m as f64
        } else {
            values[t - half..=t + half].iter().sum::<f64>() / m as f64
        };
        let detrended = match kind {
            Decomposition::Additive => values[t] - trend,
            Decomposition::Multiplicative if trend.abs() > 1e-10 => values[t] / trend,
            Decomposition::Multiplicative => continue,
        };
        sums[t % m] += detrended;
        counts[t % m] += 1;
    }

    let mut idx: Vec<f64> = sums
        .iter()
        .zip(&counts)
        .map(|(s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
        .collect();
    let centre = idx.iter().sum::<f64>() / m as f64;
    match kind {
        Decomposition::Additive => idx.iter_mut().for_each(|s| *s -= centre),
        Decomposition::Multiplicative if centre.abs() > 1e-10 => {
            idx.iter_mut().for_each(|s| *s /= centre)
        }
        Decomposition::Multiplicative => {}
    }
    idx
}

// ---------------------------------------------------------------------------
// State-space recursion
// ---------------------------------------------------------------------------

/// Forecast made after `i` observations for the next period.
fn predict_at(state: &ThetaState, p: ThetaParams, i: usize) -> f64 {
    let beta = 1.0 - p.alpha;
    state.level
        + (1.0 - 1.0 / p.theta)
            * (state.an * beta.powi(i as i32) + state.bn * (1.0 - beta.powi(i as i32 + 1)) / p.alpha)
}

fn update(state: &ThetaState, p: ThetaParams, y: f64, i: usize) -> ThetaState {
    let i_f = i as f64;
    let meany = (i_f * state.meany + y) / (i_f + 1.0);
    let bn = ((i_f - 1.0) * state.bn + 6.0 * (y - state.meany) / (i_f + 1.0)) / (i_f + 2.0);
    ThetaState {
        level: p.alpha * y + (1.0 - p.alpha) * state.level,
        meany,
        an: meany - bn * (i_f + 2.0) / 2.0,
        bn,
    }
}

/// Final state and in-sample one-step MSE.
fn run(values: &[f64], p: ThetaParams) -> (ThetaState, f64) {
    let mut state = ThetaState {
        level: p.level0,
        meany: values[0],
        an: values[0],
        bn: 0.0,
    };
    state = update(&state, p, values[0], 0);

    let mut sse = 0.0;
    for (i, &y) in values.iter().enumerate().skip(1) {
        let err = y - predict_at(&state, p, i);
        sse += err * err;
        state = update(&state, p, y, i);
    }
    (state, sse / (values.len() - 1) as f64)
}

fn optimize(values: &[f64]) -> ThetaParams {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min + 1.0;
    let bounds = Bounds::new(&[(0.01, 0.99), (1.0, 10.0), (min - span, max + span)]);
    let unpack = |x: &[f64]| ThetaParams {
        alpha: x[0],
        theta: x[1],
        level0: x[2],
    };

    let y0 = values[0];
    let starts = [[0.1, 2.0, y0], [0.3, 2.0, y0], [0.5, 2.0, y0 / 2.0], [0.1, 3.0, y0]];
    starts
        .iter()
        .map(|start| {
            optim::minimize(
                |x| run(values, unpack(x)).1,
                start,
                &bounds,
                Settings::default(),
            )
        })
        .min_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(std::cmp::Ordering::Equal))
        .map(|best| unpack(&best.point))
        .unwrap_or(ThetaParams {
            alpha: 0.5,
            theta: 2.0,
            level0: y0,
        })
}

impl ForecastModel for DynamicThetaModel {
    fn name(&self) -> &str {
        "DynamicOptimizedTheta"
    }

    fn has_intervals(&self) -> bool {
        true
    }

    fn fit_predict(&self, values: &[f64], horizon: usize, level: Option<u8>) -> Result<ForecastOutput> {
        let n = values.len();
        if n < 4 {
            return Err(EngineError::InsufficientData(format!(
                "DynamicOptimizedTheta requires at least 4 points, got {n}"
            )));
        }
        let m = self.season_length;

        let decomposition = if is_seasonal(values, m)? {
            let kind = if values.iter().any(|&y| y <= 0.0) {
                Decomposition::Additive
            } else {
                Decomposition::Multiplicative
            };
            let idx = seasonal_indices(values, m, kind);
            if kind == Decomposition::Multiplicative && idx.iter().any(|&s| s < 0.01) {
                Some((Decomposition::Additive, seasonal_indices(values, m, Decomposition::Additive)))
            } else {
                Some((kind, idx))
            }
        } else {
            None
        };

        let adjusted: Vec<f64> = match &decomposition {
            Some((Decomposition::Additive, idx)) => {
                values.iter().enumerate().map(|(t, y)| y - idx[t % m]).collect()
            }
            Some((Decomposition::Multiplicative, idx)) => {
                values.iter().enumerate().map(|(t, y)| y / idx[t % m]).collect()
            }
            None => values.to_vec(),
        };

        let params = optimize(&adjusted);
        let (state, mse) = run(&adjusted, params);

        debug!(
            seasonal = ?decomposition.as_ref().map(|d| d.0),
            alpha = format!("{:.4}", params.alpha),
            theta = format!("{:.4}", params.theta),
            mse = format!("{:.4}", mse),
            "DynamicOptimizedTheta fitted"
        );

        // Each step's forecast is fed back as the next observation.
        let mut state = state;
        let mut mean = Vec::with_capacity(horizon);
        for t in n..n + horizon {
            let base = predict_at(&state, params, t);
            state = update(&state, params, base, t);
            mean.push(match &decomposition {
                Some((Decomposition::Additive, idx)) => base + idx[t % m],
                Some((Decomposition::Multiplicative, idx)) => base * idx[t % m],
                None => base,
            });
        }

        let output = ForecastOutput::point(self.name(), mean);
        let Some(level) = level else {
            return Ok(output);
        };
        let sigma = mse.sqrt();
        let sigmas: Vec<f64> = (1..=horizon).map(|h| sigma * (h as f64).sqrt()).collect();
        let (lower, upper) = gaussian_bounds(&output.mean, &sigmas, level)?;
        Ok(output.with_intervals(lower, upper))
    }
}
