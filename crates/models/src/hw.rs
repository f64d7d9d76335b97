//! Holt-Winters exponential smoothing with additive trend and additive
//! seasonality. A season length of 1 gives Holt's linear trend method.

use common::{EngineError, ForecastModel, ForecastOutput, Result};
use tracing::debug;

use crate::intervals::gaussian_bounds;
use crate::optim::{self, Bounds, Settings};

// ---------------------------------------------------------------------------
// Type definitions
// ---------------------------------------------------------------------------

pub struct HoltWintersModel {
    season_length: usize,
}

impl HoltWintersModel {
    pub fn new(season_length: usize) -> Self {
        Self {
            season_length: season_length.max(1),
        }
    }

    fn is_seasonal(&self) -> bool {
        self.season_length > 1
    }

    fn min_length(&self) -> usize {
        if self.is_seasonal() {
            2 * self.season_length
        } else {
            3
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Smoothing {
    alpha: f64,
    beta: f64,
    gamma: f64,
}

#[derive(Debug, Clone)]
struct HwState {
    level: f64,
    trend: f64,
    seasonal: Vec<f64>,
    sse: f64,
    /// Number of one-step errors accumulated in `sse`.
    steps: usize,
}

// ---------------------------------------------------------------------------
// State initialization
// ---------------------------------------------------------------------------

/// Initial state and the index of the first observation to smooth.
fn initial_state(values: &[f64], m: usize) -> (HwState, usize) {
    if m == 1 {
        let state = HwState {
            level: values[0],
            trend: values[1] - values[0],
            seasonal: vec![0.0],
            sse: 0.0,
            steps: 0,
        };
        return (state, 1);
    }

    let first: f64 = values[..m].iter().sum::<f64>() / m as f64;
    let second: f64 = values[m..2 * m].iter().sum::<f64>() / m as f64;
    let trend = (second - first) / m as f64;
    // The first-cycle mean sits mid-cycle; indices are taken off the trend line
    // and the level is carried to the end of the cycle.
    let centre = (m - 1) as f64 / 2.0;
    let state = HwState {
        level: first + centre * trend,
        trend,
        seasonal: values[..m]
            .iter()
            .enumerate()
            .map(|(i, &v)| v - (first + (i as f64 - centre) * trend))
            .collect(),
        sse: 0.0,
        steps: 0,
    };
    (state, m)
}

// ---------------------------------------------------------------------------
// Update equations
// ---------------------------------------------------------------------------

fn smooth(values: &[f64], m: usize, params: Smoothing) -> HwState {
    let (mut state, start) = initial_state(values, m);
    let Smoothing { alpha, beta, gamma } = params;

    for (t, &y) in values.iter().enumerate().skip(start) {
        let s_prev = state.seasonal[t % m];
        let error = y - (state.level + state.trend + s_prev);
        state.sse += error * error;
        state.steps += 1;

        let prev_level = state.level;
        state.level = alpha * (y - s_prev) + (1.0 - alpha) * (prev_level + state.trend);
        state.trend = beta * (state.level - prev_level) + (1.0 - beta) * state.trend;
        if m > 1 {
            state.seasonal[t % m] = gamma * (y - state.level) + (1.0 - gamma) * s_prev;
        }
    }
    state
}

fn optimize(values: &[f64], m: usize) -> Smoothing {
    let unpack = |p: &[f64]| Smoothing {
        alpha: p[0],
        beta: p[1],
        gamma: p.get(2).copied().unwrap_or(0.0),
    };

    let (initial, bounds) = if m > 1 {
        (
            vec![0.3, 0.05, 0.1],
            Bounds::new(&[(0.001, 0.999), (0.001, 0.5), (0.001, 0.999)]),
        )
    } else {
        (vec![0.3, 0.05], Bounds::new(&[(0.001, 0.999), (0.001, 0.5)]))
    };

    let best = optim::minimize(
        |p| smooth(values, m, unpack(p)).sse,
        &initial,
        &bounds,
        Settings::default(),
    );
    unpack(&best.point)
}

// ---------------------------------------------------------------------------
// Forecasting
// ---------------------------------------------------------------------------

fn project(state: &HwState, m: usize, n: usize, horizon: usize) -> Vec<f64> {
    (1..=horizon)
        .map(|h| state.level + h as f64 * state.trend + state.seasonal[(n + h - 1) % m])
        .collect()
}

impl ForecastModel for HoltWintersModel {
    fn name(&self) -> &str {
        "HoltWinters"
    }

    fn has_intervals(&self) -> bool {
        true
    }

    fn fit_predict(&self, values: &[f64], horizon: usize, level: Option<u8>) -> Result<ForecastOutput> {
        let n = values.len();
        let m = self.season_length;
        if n < self.min_length() {
            return Err(EngineError::InsufficientData(format!(
                "HoltWinters requires at least {} points, got {}",
                self.min_length(),
                n
            )));
        }

        let params = optimize(values, m);
        let state = smooth(values, m, params);
        if !state.sse.is_finite() {
            return Err(EngineError::ModelError("HoltWinters smoothing diverged".into()));
        }

        debug!(
            season_length = m,
            horizon = horizon,
            data_length = n,
            alpha = format!("{:.4}", params.alpha),
            beta = format!("{:.4}", params.beta),
            gamma = format!("{:.4}", params.gamma),
            sse = format!("{:.4}", state.sse),
            "HoltWinters fitted"
        );

        let output = ForecastOutput::point(self.name(), project(&state, m, n, horizon));
        let Some(level) = level else {
            return Ok(output);
        };

        let residual_std = (state.sse / state.steps.max(1) as f64).sqrt();
        let sigmas: Vec<f64> = (1..=horizon)
            .map(|h| residual_std * (h as f64).sqrt())
            .collect();
        let (lower, upper) = gaussian_bounds(&output.mean, &sigmas, level)?;
        Ok(output.with_intervals(lower, upper))
    }
}

#[cfg(test)]
mod tests;
