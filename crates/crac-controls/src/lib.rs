//! Two-stage fuzzy control law for a CRAC unit.
//!
//! The controller turns a temperature error into a cooling power command in
//! two independent fuzzy stages:
//! - **Core stage**: PI-like rule base over saturated error and
//!   rate-of-change of error, producing a base power in `[0, 100]`
//! - **Compensation stage**: rule base over external temperature and thermal
//!   load, producing an adjustment in `[-20, 20]`
//!
//! The base power is scaled by a setpoint-scheduled gain, the adjustment is
//! added, and the sum is clipped to the actuator range.
//!
//! # Architecture
//!
//! - [`rulebase`] builds the two inference engines from fixed tables
//! - [`gain`] holds the setpoint-indexed gain tables
//! - [`controller`] composes both stages into one power command

pub mod controller;
pub mod error;
pub mod gain;
pub mod rulebase;
pub mod setpoint;

pub use controller::{
    ControlInputs, ControlOutput, ControllerConfig, FallbackPolicy, TwoStageController, compose,
};
pub use error::{ControlError, ControlResult};
pub use gain::{GainSchedule, OperatingMode};
pub use setpoint::Setpoint;
