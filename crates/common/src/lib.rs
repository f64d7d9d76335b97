pub mod config;
pub mod error;
pub mod frame;
pub mod metrics;
pub mod types;

pub use config::*;
pub use error::*;
pub use frame::*;
pub use types::*;
