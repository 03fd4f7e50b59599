//! Error types for control law operations.

use crac_core::CoreError;
use crac_fuzzy::FuzzyError;
use thiserror::Error;

/// Result type for control law operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur while building or running the controller.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Setpoint is not one of the supported values.
    #[error("Unsupported setpoint: {value}")]
    InvalidSetpoint { value: i64 },

    /// Numeric validation failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Fuzzy engine construction or evaluation failed.
    #[error("Inference error: {0}")]
    Inference(#[from] FuzzyError),
}
