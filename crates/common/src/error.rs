use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model error: {0}")]
    ModelError(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl EngineError {
    /// Configuration errors abort the run before any forecasting work.
    pub fn is_config(&self) -> bool {
        matches!(self, EngineError::ConfigError(_))
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
