//! Error types for the crac-app service layer.

use std::path::PathBuf;

/// Application error type wrapping errors from the backend crates.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Controller error: {0}")]
    Control(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Bus not ready after {timeout_ms} ms")]
    BusNotReady { timeout_ms: u64 },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for crac-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<crac_controls::ControlError> for AppError {
    fn from(err: crac_controls::ControlError) -> Self {
        AppError::Control(err.to_string())
    }
}

impl From<crac_sim::SimError> for AppError {
    fn from(err: crac_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}
