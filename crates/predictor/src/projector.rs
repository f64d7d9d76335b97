use std::collections::BTreeMap;

use common::{Bound, ColumnKey, Frame};
use selector::Evaluation;
use tracing::{debug, info};

/// Column label of the winning model's forecast.
pub const BEST_MODEL: &str = "best_model";

/// Floor at zero and round to two decimals.
///
/// Rounds the exact binary value, so exact ties go to the even digit.
pub fn round_forecast(value: f64) -> f64 {
    let floored = value.max(0.0);
    format!("{floored:.2}").parse().unwrap_or(floored)
}

/// Pull each entity's best-model columns out of the wide forecast frame and
/// relabel them `best_model`, `best_model-lo-<level>`, `best_model-hi-<level>`.
///
/// Entities without a best model are left out. The point forecast goes
/// through [`round_forecast`]; interval bounds are copied as they are.
pub fn project_best(forecasts: &Frame, evaluation: &Evaluation) -> Frame {
    let mut bounds: Vec<Bound> = forecasts.columns().iter().filter_map(|c| c.bound).collect();
    bounds.sort();
    bounds.dedup();

    let mut columns = vec![ColumnKey::plain(BEST_MODEL)];
    columns.extend(bounds.iter().map(|b| ColumnKey {
        name: BEST_MODEL.to_string(),
        bound: Some(*b),
    }));

    // entity -> forecast column index feeding each output column
    let mut sources: BTreeMap<&str, Vec<Option<usize>>> = BTreeMap::new();
    for entity in forecasts.entities() {
        let Some(best) = evaluation.best_model(entity) else {
            debug!(entity, "No best model, left out of the projection");
            continue;
        };
        let picks = columns
            .iter()
            .map(|c| forecasts.position(&c.renamed(best)))
            .collect();
        sources.insert(entity, picks);
    }

    let mut projected = Frame::new(columns);
    for ((entity, ts), cells) in forecasts.rows() {
        let Some(picks) = sources.get(entity.as_str()) else {
            continue;
        };
        projected.touch(entity, *ts);
        for (out, pick) in picks.iter().enumerate() {
            let Some(value) = pick.and_then(|src| cells[src]) else {
                continue;
            };
            let value = if out == 0 { round_forecast(value) } else { value };
            projected.set(entity, *ts, out, value);
        }
    }

    info!(
        entities = sources.len(),
        rows = projected.len(),
        "Best-model forecasts projected"
    );
    projected
}
