//! Fixed rule tables for the core and compensation stages.
//!
//! Label conventions:
//! - error / delta error: `NB` `NS` `ZE` `PS` `PB` (negative big ... positive big)
//! - base power: `VL` `L` `M` `H` `VH`
//! - external temperature: `cold` `mild` `hot`
//! - thermal load: `low` `medium` `high`
//! - power adjustment: `NB` `NS` `ZE` `PS` `PB`

use crac_fuzzy::{InferenceEngine, LinguisticVariable, MembershipFunction, Rule, Universe};

use crate::error::ControlResult;

pub const ERROR: &str = "error";
pub const DELTA_ERROR: &str = "delta_error";
pub const BASE_POWER: &str = "base_power";
pub const EXTERNAL_TEMPERATURE: &str = "external_temperature";
pub const THERMAL_LOAD: &str = "thermal_load";
pub const POWER_ADJUSTMENT: &str = "power_adjustment";

const ERROR_LABELS: [&str; 5] = ["NB", "NS", "ZE", "PS", "PB"];

/// Core consequents; rows are delta-error labels, columns error labels,
/// both in `ERROR_LABELS` order.
const CORE_TABLE: [[&str; 5]; 5] = [
    ["VL", "L", "H", "M", "M"],
    ["VL", "M", "H", "L", "L"],
    ["L", "H", "M", "L", "VL"],
    ["M", "H", "M", "L", "VL"],
    ["M", "M", "L", "VL", "VL"],
];

const TEXT_LABELS: [&str; 3] = ["cold", "mild", "hot"];
const LOAD_LABELS: [&str; 3] = ["low", "medium", "high"];

/// Compensation consequents; rows are load labels, columns external
/// temperature labels.
const COMPENSATION_TABLE: [[&str; 3]; 3] = [
    ["NB", "NS", "ZE"],
    ["NS", "ZE", "PS"],
    ["ZE", "PS", "PB"],
];

fn tri(a: f64, b: f64, c: f64) -> ControlResult<MembershipFunction> {
    Ok(MembershipFunction::triangular(a, b, c)?)
}

fn trap(a: f64, b: f64, c: f64, d: f64) -> ControlResult<MembershipFunction> {
    Ok(MembershipFunction::trapezoidal(a, b, c, d)?)
}

pub fn error_variable() -> ControlResult<LinguisticVariable> {
    Ok(
        LinguisticVariable::new(ERROR, Universe::new(-16.0, 16.0, 0.5)?)
            .with_term("NB", trap(-16.0, -16.0, -5.0, -2.0)?)?
            .with_term("NS", tri(-5.0, -2.0, 0.0)?)?
            .with_term("ZE", tri(-1.0, 0.0, 1.0)?)?
            .with_term("PS", tri(0.0, 2.0, 5.0)?)?
            .with_term("PB", trap(2.0, 5.0, 16.0, 16.0)?)?,
    )
}

pub fn delta_error_variable() -> ControlResult<LinguisticVariable> {
    Ok(
        LinguisticVariable::new(DELTA_ERROR, Universe::new(-2.0, 2.0, 0.05)?)
            .with_term("NB", trap(-2.0, -2.0, -1.5, -1.0)?)?
            .with_term("NS", tri(-1.5, -1.0, 0.0)?)?
            .with_term("ZE", tri(-0.5, 0.0, 0.5)?)?
            .with_term("PS", tri(0.0, 1.0, 1.5)?)?
            .with_term("PB", trap(1.0, 1.5, 2.0, 2.0)?)?,
    )
}

pub fn base_power_variable() -> ControlResult<LinguisticVariable> {
    Ok(
        LinguisticVariable::new(BASE_POWER, Universe::new(0.0, 100.0, 0.2)?)
            .with_term("VL", tri(0.0, 0.0, 25.0)?)?
            .with_term("L", tri(0.0, 25.0, 50.0)?)?
            .with_term("M", tri(25.0, 50.0, 75.0)?)?
            .with_term("H", tri(50.0, 75.0, 100.0)?)?
            .with_term("VH", tri(75.0, 100.0, 100.0)?)?,
    )
}

pub fn external_temperature_variable() -> ControlResult<LinguisticVariable> {
    Ok(
        LinguisticVariable::new(EXTERNAL_TEMPERATURE, Universe::new(10.0, 40.0, 1.0)?)
            .with_term("cold", trap(10.0, 10.0, 18.0, 22.0)?)?
            .with_term("mild", tri(20.0, 25.0, 30.0)?)?
            .with_term("hot", trap(28.0, 32.0, 40.0, 40.0)?)?,
    )
}

pub fn thermal_load_variable() -> ControlResult<LinguisticVariable> {
    Ok(
        LinguisticVariable::new(THERMAL_LOAD, Universe::new(0.0, 100.0, 1.0)?)
            .with_term("low", trap(0.0, 0.0, 25.0, 40.0)?)?
            .with_term("medium", tri(30.0, 40.0, 70.0)?)?
            .with_term("high", trap(60.0, 80.0, 100.0, 100.0)?)?,
    )
}

pub fn power_adjustment_variable() -> ControlResult<LinguisticVariable> {
    Ok(
        LinguisticVariable::new(POWER_ADJUSTMENT, Universe::new(-20.0, 20.0, 0.5)?)
            .with_term("NB", trap(-20.0, -20.0, -10.0, -5.0)?)?
            .with_term("NS", tri(-10.0, -5.0, 0.0)?)?
            .with_term("ZE", tri(-5.0, 0.0, 5.0)?)?
            .with_term("PS", tri(0.0, 5.0, 10.0)?)?
            .with_term("PB", trap(5.0, 10.0, 20.0, 20.0)?)?,
    )
}

/// PI-like core stage: 25 rules over error x delta error.
pub fn core_stage() -> ControlResult<InferenceEngine> {
    let mut rules = Vec::with_capacity(25);
    for (row, delta_label) in CORE_TABLE.iter().zip(ERROR_LABELS) {
        for (power_label, error_label) in row.iter().zip(ERROR_LABELS) {
            rules.push(
                Rule::when(ERROR, error_label)
                    .and(DELTA_ERROR, delta_label)
                    .then(BASE_POWER, *power_label),
            );
        }
    }
    Ok(InferenceEngine::new(
        vec![error_variable()?, delta_error_variable()?],
        base_power_variable()?,
        rules,
    )?)
}

/// Environmental compensation stage: 9 rules over external temperature x load.
pub fn compensation_stage() -> ControlResult<InferenceEngine> {
    let mut rules = Vec::with_capacity(9);
    for (row, load_label) in COMPENSATION_TABLE.iter().zip(LOAD_LABELS) {
        for (adjust_label, text_label) in row.iter().zip(TEXT_LABELS) {
            rules.push(
                Rule::when(EXTERNAL_TEMPERATURE, text_label)
                    .and(THERMAL_LOAD, load_label)
                    .then(POWER_ADJUSTMENT, *adjust_label),
            );
        }
    }
    Ok(InferenceEngine::new(
        vec![external_temperature_variable()?, thermal_load_variable()?],
        power_adjustment_variable()?,
        rules,
    )?)
}
