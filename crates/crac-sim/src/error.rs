//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered while configuring or stepping the simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<crac_core::CoreError> for SimError {
    fn from(e: crac_core::CoreError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}
