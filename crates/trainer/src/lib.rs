//! Per-entity forecasting and rolling-origin backtesting over a worker pool.

mod cross_validation;
mod pool;
mod runner;

pub use cross_validation::{CrossValidation, CrossValidator};
pub use pool::WorkerPool;
pub use runner::{ForecastFailure, ForecastRunner};
