//! Error taxonomy for the simulator.

use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Environment not found: {0}")]
    EnvironmentNotFound(String),

    #[error("Strategy not found: {0}")]
    StrategyNotFound(String),

    /// Rejected before any simulation work starts.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An aggregation step referenced state that does not exist.
    #[error("Data integrity fault: {0}")]
    DataIntegrity(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SimError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// True for errors caused by the caller's request rather than the environment.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::EnvironmentNotFound(_) | Self::StrategyNotFound(_) | Self::InvalidConfiguration(_)
        )
    }
}
