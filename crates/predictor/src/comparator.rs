use common::{Frame, JoinKind};
use tracing::info;

/// Inner join of the best-model projection with the baseline forecast on
/// (entity, timestamp). Shared column names get `_best` / `_baseline`.
pub fn compare_with_baseline(best: &Frame, baseline: &Frame) -> Frame {
    let comparison = best.join(baseline, JoinKind::Inner, ("_best", "_baseline"));
    info!(
        rows = comparison.len(),
        entities = comparison.entities().len(),
        "Baseline comparison ready"
    );
    comparison
}
