//! Mamdani fuzzy-inference primitives.
//!
//! This crate provides a small, allocation-light fuzzy engine used by the
//! CRAC controller. It is split into:
//! - **Membership functions**: triangular and trapezoidal shapes
//! - **Linguistic variables**: a named universe holding labelled fuzzy sets
//! - **Rules**: conjunctive antecedents with a single consequent
//! - **Inference engine**: fuzzification, min-AND firing, clipping
//!   implication, max aggregation and centroid defuzzification
//!
//! # Design Principles
//!
//! - **Validated construction**: variables and rules are checked once, when
//!   the engine is built; evaluation only fails on bad inputs
//! - **No hidden state**: every evaluation builds its own aggregation, so an
//!   engine can be shared and reused across ticks
//! - **Caller-owned saturation**: crisp inputs are expected inside the
//!   variable universes; see [`LinguisticVariable::clamp`]

pub mod engine;
pub mod error;
pub mod membership;
pub mod rule;
pub mod variable;

pub use engine::{Aggregation, InferenceEngine};
pub use error::{FuzzyError, FuzzyResult};
pub use membership::MembershipFunction;
pub use rule::{Rule, RuleBuilder, Term};
pub use variable::{LinguisticVariable, Universe};
