use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum WidthError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing position tracker")]
    MissingPositionTracker,
    #[error("missing flow command sink")]
    MissingFlowSink,
    #[error("missing sensor config")]
    MissingConfig,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
