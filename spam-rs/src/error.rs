use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Algorithm '{0}' is not supported")]
    UnsupportedAlgorithm(String),

    #[error("Model not trained: {0}")]
    NotTrained(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Model error: {0}")]
    Model(#[from] candle_core::Error),

    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Worker task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, SpamError>;
