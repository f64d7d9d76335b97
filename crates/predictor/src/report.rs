use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use common::{ColumnKey, Frame, JoinKind, Series};
use tracing::info;

/// Column holding the observed (gap-filled) history.
pub const HISTORY_COLUMN: &str = "y";

pub fn history_frame(series: &[Series]) -> Frame {
    let mut frame = Frame::new(vec![ColumnKey::plain(HISTORY_COLUMN)]);
    for s in series {
        for (ts, value) in s.timestamps.iter().zip(&s.values) {
            frame.set(&s.entity_id, *ts, 0, *value);
        }
    }
    frame
}

/// Outer join of history, per-model forecasts and the baseline comparison.
///
/// Model columns that appear both among the candidates and in the
/// comparison keep their name on the forecast side and get `_baseline` on
/// the comparison side. Rows are restricted to timestamps seen in the
/// history or the forecast horizon.
pub fn assemble_final_data(history: &Frame, forecasts: &Frame, comparison: &Frame) -> Frame {
    let merged = forecasts.join(comparison, JoinKind::Outer, ("", "_baseline"));
    let mut final_data = history.join(&merged, JoinKind::Outer, ("", "_forecast"));

    let known: BTreeSet<NaiveDateTime> = history
        .timestamps()
        .union(&forecasts.timestamps())
        .copied()
        .collect();
    final_data.retain(|_, ts| known.contains(&ts));

    info!(
        rows = final_data.len(),
        columns = final_data.columns().len(),
        "Final report assembled"
    );
    final_data
}
