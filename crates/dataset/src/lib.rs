//! File boundary of the engine: observations in, configuration in, report out.

mod config_source;
mod observations;
mod report;

pub use config_source::read_config;
pub use observations::{read_observations, InputFormat};
pub use report::{format_timestamp, write_report, ReportFormat, EVALUATION_DATA_FILE, FINAL_DATA_FILE};
