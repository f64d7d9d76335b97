//! Best-model projection, baseline comparison and the end-to-end run.

mod comparator;
mod pipeline;
mod projector;
mod report;

pub use comparator::compare_with_baseline;
pub use pipeline::{run, RunOutcome};
pub use projector::{project_best, round_forecast, BEST_MODEL};
pub use report::{assemble_final_data, history_frame, HISTORY_COLUMN};
