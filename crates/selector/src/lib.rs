mod selector;

pub use selector::{evaluate, selection_summary, Evaluation, EvaluationRecord};
