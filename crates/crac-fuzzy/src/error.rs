//! Error types for fuzzy-inference operations.

use crac_core::CoreError;
use thiserror::Error;

/// Result type for fuzzy-inference operations.
pub type FuzzyResult<T> = Result<T, FuzzyError>;

/// Errors raised while building or evaluating a fuzzy system.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FuzzyError {
    /// Numeric validation failure from the core crate.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Membership function breakpoints are not ordered.
    #[error("Invalid membership shape: {what}")]
    InvalidShape { what: &'static str },

    /// Universe bounds or step are unusable.
    #[error("Invalid universe: {what}")]
    InvalidUniverse { what: &'static str },

    /// A fuzzy set extends beyond its variable's universe.
    #[error("Term '{label}' of variable '{variable}' lies outside the universe")]
    TermOutOfUniverse { variable: String, label: String },

    /// Labels must be unique per variable.
    #[error("Duplicate label '{label}' in variable '{variable}'")]
    DuplicateLabel { variable: String, label: String },

    /// Variable names must be unique per engine.
    #[error("Duplicate variable '{name}'")]
    DuplicateVariable { name: String },

    /// A rule references a variable the engine does not know.
    #[error("Unknown variable '{name}'")]
    UnknownVariable { name: String },

    /// A rule references a label the variable does not define.
    #[error("Unknown label '{label}' for variable '{variable}'")]
    UnknownLabel { variable: String, label: String },

    /// A rule was built without any antecedent term.
    #[error("Rule has no antecedent")]
    EmptyAntecedent,

    /// An engine was built without rules.
    #[error("Rule base is empty")]
    EmptyRuleBase,

    /// A required crisp input was not supplied.
    #[error("Missing input '{name}'")]
    MissingInput { name: String },

    /// A crisp input names no registered input variable.
    #[error("Unexpected input '{name}'")]
    UnknownInput { name: String },
}
