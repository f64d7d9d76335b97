//! Box-constrained Nelder-Mead simplex search shared by the smoothing,
//! theta and ARIMA estimators.

use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub(crate) struct Bounds {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl Bounds {
    pub fn new(pairs: &[(f64, f64)]) -> Self {
        Self {
            lower: pairs.iter().map(|p| p.0).collect(),
            upper: pairs.iter().map(|p| p.1).collect(),
        }
    }

    fn clamp(&self, point: &mut [f64]) {
        for (i, v) in point.iter_mut().enumerate() {
            *v = v.clamp(self.lower[i], self.upper[i]);
        }
    }

    fn width(&self, i: usize) -> f64 {
        let w = self.upper[i] - self.lower[i];
        if w.is_finite() {
            w
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Settings {
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_iter: 200,
            tol: 1e-6,
        }
    }
}

/// Minimum found and the objective value there.
#[derive(Debug, Clone)]
pub(crate) struct Optimum {
    pub point: Vec<f64>,
    pub value: f64,
}

fn cmp_f64(a: &f64, b: &f64) -> Ordering {
    a.partial_cmp(b).unwrap_or(Ordering::Equal)
}

/// Non-finite objective values are treated as +inf so the simplex moves
/// away from them.
pub(crate) fn minimize<F>(f: F, initial: &[f64], bounds: &Bounds, settings: Settings) -> Optimum
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |x: &[f64]| {
        let v = f(x);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    let dim = initial.len();
    let mut start = initial.to_vec();
    bounds.clamp(&mut start);

    let mut simplex: Vec<Vec<f64>> = vec![start.clone()];
    for i in 0..dim {
        let step = bounds.width(i) * 0.1;
        let mut vertex = start.clone();
        vertex[i] = (vertex[i] + step).min(bounds.upper[i]);
        if (vertex[i] - start[i]).abs() < 1e-12 {
            vertex[i] = (vertex[i] - step).max(bounds.lower[i]);
        }
        simplex.push(vertex);
    }
    let mut scores: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let towards = |from: &[f64], to: &[f64], t: f64| -> Vec<f64> {
        let mut p: Vec<f64> = from.iter().zip(to).map(|(a, b)| a + t * (b - a)).collect();
        bounds.clamp(&mut p);
        p
    };

    for _ in 0..settings.max_iter {
        let mut order: Vec<usize> = (0..=dim).collect();
        order.sort_by(|&a, &b| cmp_f64(&scores[a], &scores[b]));
        let (best, worst, second) = (order[0], order[dim], order[dim.saturating_sub(1)]);

        let spread = simplex[best]
            .iter()
            .zip(&simplex[worst])
            .map(|(a, b)| (a - b).abs())
            .fold(0.0_f64, f64::max);
        if spread < settings.tol {
            break;
        }

        let mut centroid = vec![0.0; dim];
        for &idx in &order[..dim] {
            for (c, x) in centroid.iter_mut().zip(&simplex[idx]) {
                *c += x / dim as f64;
            }
        }

        let reflected = towards(&simplex[worst], &centroid, 2.0);
        let f_reflected = eval(&reflected);

        if f_reflected < scores[best] {
            let expanded = towards(&simplex[worst], &centroid, 3.0);
            let f_expanded = eval(&expanded);
            if f_expanded < f_reflected {
                simplex[worst] = expanded;
                scores[worst] = f_expanded;
            } else {
                simplex[worst] = reflected;
                scores[worst] = f_reflected;
            }
            continue;
        }

        if f_reflected < scores[second] {
            simplex[worst] = reflected;
            scores[worst] = f_reflected;
            continue;
        }

        let (anchor, f_anchor) = if f_reflected < scores[worst] {
            (reflected, f_reflected)
        } else {
            (simplex[worst].clone(), scores[worst])
        };
        let contracted = towards(&centroid, &anchor, 0.5);
        let f_contracted = eval(&contracted);
        if f_contracted < f_anchor {
            simplex[worst] = contracted;
            scores[worst] = f_contracted;
            continue;
        }

        // Shrink towards the best vertex.
        let best_point = simplex[best].clone();
        for &idx in &order[1..] {
            simplex[idx] = towards(&best_point, &simplex[idx], 0.5);
            scores[idx] = eval(&simplex[idx]);
        }
    }

    let best = (0..=dim)
        .min_by(|&a, &b| cmp_f64(&scores[a], &scores[b]))
        .unwrap_or(0);
    Optimum {
        point: simplex[best].clone(),
        value: scores[best],
    }
}
