use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use common::{CrossValidationRow, ErrorMetric};
use serde::Serialize;
use tracing::{debug, info};

/// Averaged backtest error of every model for one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationRecord {
    pub entity_id: String,
    /// One score per model, in the order of [`Evaluation::models`]; `None`
    /// when no window produced a usable score.
    pub scores: Vec<Option<f64>>,
    /// Model with the lowest score. The first model in run order wins ties.
    pub best_model: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub metric: ErrorMetric,
    pub models: Vec<String>,
    /// Sorted by entity.
    pub records: Vec<EvaluationRecord>,
}

impl Evaluation {
    pub fn record(&self, entity_id: &str) -> Option<&EvaluationRecord> {
        self.records
            .binary_search_by(|r| r.entity_id.as_str().cmp(entity_id))
            .ok()
            .map(|i| &self.records[i])
    }

    pub fn best_model(&self, entity_id: &str) -> Option<&str> {
        self.record(entity_id)?.best_model.as_deref()
    }

    pub fn score(&self, entity_id: &str, model: &str) -> Option<f64> {
        let idx = self.models.iter().position(|m| m == model)?;
        self.record(entity_id)?.scores[idx]
    }
}

/// Forecast/actual pairs of one model within one window.
#[derive(Default)]
struct WindowPairs {
    forecast: Vec<f64>,
    actual: Vec<f64>,
}

/// Score every model per entity and pick the best one.
///
/// The metric is computed independently for each cutoff, then averaged over
/// the cutoffs that produced a finite score.
pub fn evaluate(rows: &[CrossValidationRow], models: &[String], metric: ErrorMetric) -> Evaluation {
    let mut windows: BTreeMap<&str, BTreeMap<NaiveDateTime, Vec<WindowPairs>>> = BTreeMap::new();
    for row in rows {
        let pairs = windows
            .entry(row.entity_id.as_str())
            .or_default()
            .entry(row.cutoff)
            .or_insert_with(|| (0..models.len()).map(|_| WindowPairs::default()).collect());
        for (model, prediction) in pairs.iter_mut().zip(&row.predictions) {
            if let Some(value) = prediction {
                model.forecast.push(*value);
                model.actual.push(row.actual);
            }
        }
    }

    let records: Vec<EvaluationRecord> = windows
        .into_iter()
        .map(|(entity_id, by_cutoff)| {
            let scores: Vec<Option<f64>> = (0..models.len())
                .map(|m| {
                    let window_scores: Vec<f64> = by_cutoff
                        .values()
                        .filter(|w| !w[m].forecast.is_empty())
                        .map(|w| metric.score(&w[m].forecast, &w[m].actual))
                        .filter(|s| s.is_finite())
                        .collect();
                    if window_scores.is_empty() {
                        None
                    } else {
                        Some(window_scores.iter().sum::<f64>() / window_scores.len() as f64)
                    }
                })
                .collect();

            let best_model = arg_min(&scores).map(|i| models[i].clone());
            debug!(
                entity = entity_id,
                windows = by_cutoff.len(),
                best = ?best_model,
                "Entity evaluated"
            );
            EvaluationRecord {
                entity_id: entity_id.to_string(),
                scores,
                best_model,
            }
        })
        .collect();

    info!(
        entities = records.len(),
        metric = metric.label(),
        without_winner = records.iter().filter(|r| r.best_model.is_none()).count(),
        "Evaluation complete"
    );

    Evaluation {
        metric,
        models: models.to_vec(),
        records,
    }
}

/// Index of the smallest score; the earliest wins on equality.
fn arg_min(scores: &[Option<f64>]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, score) in scores.iter().enumerate() {
        if let Some(s) = *score {
            if best.map_or(true, |(_, b)| s < b) {
                best = Some((i, s));
            }
        }
    }
    best.map(|(i, _)| i)
}

/// Number of entities won by each model, fewest first. Ties are ordered by name.
pub fn selection_summary(evaluation: &Evaluation) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for best in evaluation.records.iter().filter_map(|r| r.best_model.as_deref()) {
        *counts.entry(best).or_default() += 1;
    }
    let mut summary: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(model, count)| (model.to_string(), count))
        .collect();
    summary.sort_by_key(|(_, count)| *count);
    summary
}
