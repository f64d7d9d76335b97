//! Automatic non-seasonal ARIMA.
//!
//! The differencing order comes from repeated KPSS tests; AR and MA orders
//! up to 2 are fitted by conditional sum of squares and ranked by AICc.

use common::{EngineError, ForecastModel, ForecastOutput, Result};
use tracing::debug;

use crate::intervals::gaussian_bounds;
use crate::optim::{self, Bounds, Settings};

const MAX_P: usize = 2;
const MAX_Q: usize = 2;
const MAX_D: usize = 2;
/// 5% critical value of the KPSS level-stationarity statistic.
const KPSS_CRITICAL: f64 = 0.463;

pub struct AutoArimaModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Order {
    p: usize,
    d: usize,
    q: usize,
}

#[derive(Debug, Clone)]
struct FittedArima {
    order: Order,
    intercept: f64,
    ar: Vec<f64>,
    ma: Vec<f64>,
    residuals: Vec<f64>,
    sigma2: f64,
    aicc: f64,
}

// ---------------------------------------------------------------------------
// Differencing
// ---------------------------------------------------------------------------

fn difference(values: &[f64], d: usize) -> Vec<f64> {
    (0..d).fold(values.to_vec(), |acc, _| acc.windows(2).map(|w| w[1] - w[0]).collect())
}

fn kpss_statistic(values: &[f64]) -> f64 {
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let e: Vec<f64> = values.iter().map(|v| v - mean).collect();

    let lags = (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize;
    let mut lrv = e.iter().map(|x| x * x).sum::<f64>() / n as f64;
    for k in 1..=lags.min(n - 1) {
        let weight = 1.0 - k as f64 / (lags + 1) as f64;
        let cov: f64 = (k..n).map(|t| e[t] * e[t - k]).sum::<f64>() / n as f64;
        lrv += 2.0 * weight * cov;
    }
    if lrv < 1e-12 {
        return 0.0;
    }

    let mut partial = 0.0;
    let eta: f64 = e
        .iter()
        .map(|x| {
            partial += x;
            partial * partial
        })
        .sum();
    eta / ((n * n) as f64 * lrv)
}

/// Smallest `d` whose differenced series passes the KPSS test.
fn choose_differencing(values: &[f64]) -> usize {
    let mut d = 0;
    let mut series = values.to_vec();
    while d < MAX_D && series.len() > 3 && kpss_statistic(&series) > KPSS_CRITICAL {
        series = difference(&series, 1);
        d += 1;
    }
    d
}

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

/// One-step residuals of an ARMA model on the differenced series.
fn css_residuals(w: &[f64], intercept: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let start = ar.len().max(ma.len());
    let mut residuals = vec![0.0; w.len()];
    for t in start..w.len() {
        let mut pred = intercept;
        for (i, phi) in ar.iter().enumerate() {
            pred += phi * (w[t - 1 - i] - intercept);
        }
        for (i, theta) in ma.iter().enumerate() {
            pred += theta * residuals[t - 1 - i];
        }
        residuals[t] = w[t] - pred;
    }
    residuals
}

fn fit_order(values: &[f64], order: Order) -> Option<FittedArima> {
    let w = difference(values, order.d);
    let with_mean = order.d < 2;
    let start = order.p.max(order.q);
    let n_eff = w.len().checked_sub(start)?;
    let k = order.p + order.q + usize::from(with_mean) + 1;
    if n_eff <= k + 1 {
        return None;
    }

    let mean = w.iter().sum::<f64>() / w.len() as f64;
    let sd = (w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / w.len() as f64).sqrt();

    let split = |x: &[f64]| -> (f64, Vec<f64>, Vec<f64>) {
        let (c, rest) = if with_mean { (x[0], &x[1..]) } else { (0.0, x) };
        (c, rest[..order.p].to_vec(), rest[order.p..].to_vec())
    };
    let css = |x: &[f64]| {
        let (c, ar, ma) = split(x);
        css_residuals(&w, c, &ar, &ma)[start..].iter().map(|r| r * r).sum::<f64>()
    };

    let mut initial = Vec::new();
    let mut bounds = Vec::new();
    if with_mean {
        initial.push(mean);
        bounds.push((mean - 10.0 * sd - 1.0, mean + 10.0 * sd + 1.0));
    }
    for i in (0..order.p).chain(0..order.q) {
        initial.push(0.1 / (i + 1) as f64);
        bounds.push((-0.99, 0.99));
    }

    let params = if initial.is_empty() {
        Vec::new()
    } else {
        optim::minimize(
            css,
            &initial,
            &Bounds::new(&bounds),
            Settings {
                max_iter: 1000,
                tol: 1e-8,
            },
        )
        .point
    };

    let (intercept, ar, ma) = split(&params);
    let residuals = css_residuals(&w, intercept, &ar, &ma);
    let sigma2 = residuals[start..].iter().map(|r| r * r).sum::<f64>() / n_eff as f64;
    if !sigma2.is_finite() {
        return None;
    }

    let n = n_eff as f64;
    let kf = k as f64;
    let loglik = -0.5 * n * ((2.0 * std::f64::consts::PI * sigma2.max(1e-300)).ln() + 1.0);
    let aicc = -2.0 * loglik + 2.0 * kf + 2.0 * kf * (kf + 1.0) / (n - kf - 1.0);

    Some(FittedArima {
        order,
        intercept,
        ar,
        ma,
        residuals,
        sigma2,
        aicc,
    })
}

// ---------------------------------------------------------------------------
// Forecasting
// ---------------------------------------------------------------------------

fn forecast_mean(values: &[f64], fit: &FittedArima, horizon: usize) -> Vec<f64> {
    let mut w = difference(values, fit.order.d);
    let mut e = fit.residuals.clone();
    let mut diffs_out = Vec::with_capacity(horizon);
    for _ in 0..horizon {
        let t = w.len();
        let mut pred = fit.intercept;
        for (i, phi) in fit.ar.iter().enumerate() {
            if t > i {
                pred += phi * (w[t - 1 - i] - fit.intercept);
            }
        }
        for (i, theta) in fit.ma.iter().enumerate() {
            if t > i {
                pred += theta * e[t - 1 - i];
            }
        }
        w.push(pred);
        e.push(0.0);
        diffs_out.push(pred);
    }

    // Undo differencing: carry the last value of every intermediate difference.
    let mut last: Vec<f64> = (0..fit.order.d)
        .map(|k| *difference(values, k).last().unwrap_or(&0.0))
        .collect();
    diffs_out
        .into_iter()
        .map(|mut v| {
            for k in (0..fit.order.d).rev() {
                last[k] += v;
                v = last[k];
            }
            v
        })
        .collect()
}

/// MA(inf) weights of the integrated process, used for interval widths.
fn psi_weights(fit: &FittedArima, horizon: usize) -> Vec<f64> {
    // (1 - sum phi_i B^i) (1 - B)^d expanded into 1 - sum phi*_i B^i.
    let mut poly = vec![1.0];
    poly.extend(fit.ar.iter().map(|phi| -phi));
    for _ in 0..fit.order.d {
        let mut next = vec![0.0; poly.len() + 1];
        for (i, c) in poly.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c;
        }
        poly = next;
    }
    let phi_star: Vec<f64> = poly[1..].iter().map(|c| -c).collect();

    let mut psi = vec![1.0];
    for j in 1..horizon {
        let mut v = fit.ma.get(j - 1).copied().unwrap_or(0.0);
        for (i, phi) in phi_star.iter().enumerate().take(j) {
            v += phi * psi[j - 1 - i];
        }
        psi.push(v);
    }
    psi
}

impl ForecastModel for AutoArimaModel {
    fn name(&self) -> &str {
        "AutoARIMA"
    }

    fn has_intervals(&self) -> bool {
        true
    }

    fn fit_predict(&self, values: &[f64], horizon: usize, level: Option<u8>) -> Result<ForecastOutput> {
        if values.len() < 4 {
            return Err(EngineError::InsufficientData(format!(
                "AutoARIMA requires at least 4 points, got {}",
                values.len()
            )));
        }

        let d = choose_differencing(values);
        let mut best: Option<FittedArima> = None;
        for p in 0..=MAX_P {
            for q in 0..=MAX_Q {
                let Some(fit) = fit_order(values, Order { p, d, q }) else {
                    continue;
                };
                debug!(p, d, q, aicc = format!("{:.4}", fit.aicc), "AutoARIMA candidate");
                if fit.aicc.is_finite() && best.as_ref().map_or(true, |b| fit.aicc < b.aicc) {
                    best = Some(fit);
                }
            }
        }

        let fit = best.ok_or_else(|| {
            EngineError::ModelError(format!("no ARIMA order could be fitted (d = {d})"))
        })?;

        debug!(
            p = fit.order.p,
            d = fit.order.d,
            q = fit.order.q,
            aicc = format!("{:.4}", fit.aicc),
            "AutoARIMA selected model"
        );

        let output = ForecastOutput::point(self.name(), forecast_mean(values, &fit, horizon));
        let Some(level) = level else {
            return Ok(output);
        };

        let psi = psi_weights(&fit, horizon);
        let mut cumulative = 0.0;
        let sigmas: Vec<f64> = psi
            .iter()
            .map(|w| {
                cumulative += w * w;
                (fit.sigma2 * cumulative).sqrt()
            })
            .collect();
        let (lower, upper) = gaussian_bounds(&output.mean, &sigmas, level)?;
        Ok(output.with_intervals(lower, upper))
    }
}

#[cfg(test)]
mod tests;
