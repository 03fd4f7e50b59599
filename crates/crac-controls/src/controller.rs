//! Two-stage controller composition.
//!
//! `power = clip(base_power * Kp(setpoint, mode) + adjustment, out_min, out_max)`
//!
//! Inputs to the core stage are saturated to fixed symmetric bounds and then
//! to the variable universes; compensation inputs are clamped to their
//! universes. When a stage produces no defuzzifiable output the configured
//! fallback value is substituted.

use crac_core::{ensure_finite, saturate};
use crac_fuzzy::InferenceEngine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ControlError, ControlResult};
use crate::gain::{GainSchedule, OperatingMode};
use crate::rulebase::{self, DELTA_ERROR, ERROR, EXTERNAL_TEMPERATURE, THERMAL_LOAD};
use crate::setpoint::Setpoint;

/// Values substituted when a stage has no rule firing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    /// Base power used when the core stage is empty.
    pub core_stage: f64,
    /// Adjustment used when the compensation stage is empty.
    pub compensation_stage: f64,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            core_stage: 100.0,
            compensation_stage: 0.0,
        }
    }
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Symmetric saturation bound for the error input.
    pub error_bound: f64,
    /// Symmetric saturation bound for the delta-error input.
    pub delta_error_bound: f64,
    /// Minimum commanded power.
    pub out_min: f64,
    /// Maximum commanded power.
    pub out_max: f64,
    pub fallback: FallbackPolicy,
    /// Gains for live operation.
    pub dynamic_gains: GainSchedule,
    /// Gains for the scripted 24 h scenario.
    pub scripted_gains: GainSchedule,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            error_bound: 16.5,
            delta_error_bound: 2.05,
            out_min: 0.0,
            out_max: 100.0,
            fallback: FallbackPolicy::default(),
            dynamic_gains: GainSchedule::dynamic(),
            scripted_gains: GainSchedule::scripted(),
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> ControlResult<()> {
        if self.error_bound.is_nan() || self.error_bound <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "error_bound must be positive",
            });
        }
        if self.delta_error_bound.is_nan() || self.delta_error_bound <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "delta_error_bound must be positive",
            });
        }
        if self.out_min.is_nan() || self.out_max.is_nan() || self.out_min >= self.out_max {
            return Err(ControlError::InvalidArg {
                what: "out_min must be less than out_max",
            });
        }
        if !self.fallback.core_stage.is_finite() || !self.fallback.compensation_stage.is_finite() {
            return Err(ControlError::InvalidArg {
                what: "fallback values must be finite",
            });
        }
        self.dynamic_gains.validate()?;
        self.scripted_gains.validate()
    }

    pub fn gains(&self, mode: OperatingMode) -> &GainSchedule {
        match mode {
            OperatingMode::Dynamic => &self.dynamic_gains,
            OperatingMode::Scripted => &self.scripted_gains,
        }
    }
}

/// Crisp signals entering one control tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlInputs {
    pub error: f64,
    pub delta_error: f64,
    pub external_temperature: f64,
    pub load: f64,
}

/// Result of one control tick, with intermediates kept for telemetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    pub base_power: f64,
    pub gain: f64,
    pub adjustment: f64,
    /// `base_power * gain + adjustment`, before clipping.
    pub unclipped: f64,
    /// Final commanded power.
    pub power: f64,
    pub core_fallback: bool,
    pub compensation_fallback: bool,
}

/// Clip the composed command to `[out_min, out_max]`.
pub fn compose(base_power: f64, gain: f64, adjustment: f64, out_min: f64, out_max: f64) -> f64 {
    (base_power * gain + adjustment).clamp(out_min, out_max)
}

/// Core + compensation fuzzy stages with gain scheduling.
#[derive(Debug, Clone)]
pub struct TwoStageController {
    core: InferenceEngine,
    compensation: InferenceEngine,
    config: ControllerConfig,
}

impl TwoStageController {
    /// Build both stages from the fixed rule tables.
    pub fn new(config: ControllerConfig) -> ControlResult<Self> {
        Self::with_stages(
            rulebase::core_stage()?,
            rulebase::compensation_stage()?,
            config,
        )
    }

    /// Build from caller-supplied stages.
    ///
    /// The core stage must read exactly [`ERROR`] and [`DELTA_ERROR`]; the
    /// compensation stage exactly [`EXTERNAL_TEMPERATURE`] and
    /// [`THERMAL_LOAD`]. Rule coverage is not checked: inputs that fire no
    /// rule get the configured fallback.
    ///
    /// # Errors
    ///
    /// Returns error if the config is invalid or a stage reads other inputs.
    pub fn with_stages(
        core: InferenceEngine,
        compensation: InferenceEngine,
        config: ControllerConfig,
    ) -> ControlResult<Self> {
        config.validate()?;
        if !reads_exactly(&core, &[ERROR, DELTA_ERROR]) {
            return Err(ControlError::InvalidArg {
                what: "core stage must read error and delta_error",
            });
        }
        if !reads_exactly(&compensation, &[EXTERNAL_TEMPERATURE, THERMAL_LOAD]) {
            return Err(ControlError::InvalidArg {
                what: "compensation stage must read external_temperature and thermal_load",
            });
        }
        Ok(Self {
            core,
            compensation,
            config,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn core_stage(&self) -> &InferenceEngine {
        &self.core
    }

    pub fn compensation_stage(&self) -> &InferenceEngine {
        &self.compensation
    }

    /// Saturated `(error, delta_error)` as fed to the core stage.
    pub fn saturate_core_inputs(&self, error: f64, delta_error: f64) -> (f64, f64) {
        let e = saturate(error, self.config.error_bound);
        let de = saturate(delta_error, self.config.delta_error_bound);
        (clamp_to(&self.core, ERROR, e), clamp_to(&self.core, DELTA_ERROR, de))
    }

    /// Base power from the core stage, with fallback.
    pub fn base_power(&self, error: f64, delta_error: f64) -> ControlResult<(f64, bool)> {
        let (e, de) = self.saturate_core_inputs(error, delta_error);
        match self.core.evaluate(&[(ERROR, e), (DELTA_ERROR, de)])? {
            Some(p) => Ok((p, false)),
            None => {
                debug!(error = e, delta_error = de, "core stage empty, using fallback");
                Ok((self.config.fallback.core_stage, true))
            }
        }
    }

    /// Power adjustment from the compensation stage, with fallback.
    pub fn adjustment(&self, external_temperature: f64, load: f64) -> ControlResult<(f64, bool)> {
        let text = clamp_to(&self.compensation, EXTERNAL_TEMPERATURE, external_temperature);
        let load = clamp_to(&self.compensation, THERMAL_LOAD, load);
        match self
            .compensation
            .evaluate(&[(EXTERNAL_TEMPERATURE, text), (THERMAL_LOAD, load)])?
        {
            Some(dp) => Ok((dp, false)),
            None => {
                debug!(
                    external_temperature = text,
                    load, "compensation stage empty, using fallback"
                );
                Ok((self.config.fallback.compensation_stage, true))
            }
        }
    }

    /// Per-rule firing strengths of `(core, compensation)` for the inputs as
    /// the stages would see them after saturation and clamping.
    pub fn firing_strengths(&self, inputs: &ControlInputs) -> ControlResult<(Vec<f64>, Vec<f64>)> {
        let (e, de) = self.saturate_core_inputs(inputs.error, inputs.delta_error);
        let core = self.core.firing_strengths(&[(ERROR, e), (DELTA_ERROR, de)])?;
        let text = clamp_to(
            &self.compensation,
            EXTERNAL_TEMPERATURE,
            inputs.external_temperature,
        );
        let load = clamp_to(&self.compensation, THERMAL_LOAD, inputs.load);
        let compensation = self
            .compensation
            .firing_strengths(&[(EXTERNAL_TEMPERATURE, text), (THERMAL_LOAD, load)])?;
        Ok((core, compensation))
    }

    /// Compute one power command.
    ///
    /// # Errors
    ///
    /// Returns error if an input is non-finite.
    pub fn compute(
        &self,
        setpoint: Setpoint,
        mode: OperatingMode,
        inputs: &ControlInputs,
    ) -> ControlResult<ControlOutput> {
        ensure_finite(inputs.error, "error")?;
        ensure_finite(inputs.delta_error, "delta error")?;

        let (base_power, core_fallback) = self.base_power(inputs.error, inputs.delta_error)?;
        let (adjustment, compensation_fallback) =
            self.adjustment(inputs.external_temperature, inputs.load)?;
        let gain = self.config.gains(mode).gain(setpoint);
        let unclipped = base_power * gain + adjustment;
        let power = compose(
            base_power,
            gain,
            adjustment,
            self.config.out_min,
            self.config.out_max,
        );

        Ok(ControlOutput {
            base_power,
            gain,
            adjustment,
            unclipped,
            power,
            core_fallback,
            compensation_fallback,
        })
    }
}

fn clamp_to(engine: &InferenceEngine, variable: &str, x: f64) -> f64 {
    engine.input(variable).map_or(x, |v| v.clamp(x))
}

fn reads_exactly(engine: &InferenceEngine, names: &[&str]) -> bool {
    engine.inputs().len() == names.len() && names.iter().all(|n| engine.input(n).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> TwoStageController {
        TwoStageController::new(ControllerConfig::default()).unwrap()
    }

    #[test]
    fn equilibrium_at_setpoint_25() {
        let c = controller();
        let out = c
            .compute(
                Setpoint::C25,
                OperatingMode::Dynamic,
                &ControlInputs {
                    error: 0.0,
                    delta_error: 0.0,
                    external_temperature: 25.0,
                    load: 40.0,
                },
            )
            .unwrap();
        assert!((out.base_power - 50.0).abs() < 1e-6);
        assert_eq!(out.gain, 0.09);
        assert!(out.adjustment.abs() < 1e-6);
        assert!((out.power - 4.5).abs() < 1e-6, "power = {}", out.power);
        assert!(!out.core_fallback && !out.compensation_fallback);
    }

    #[test]
    fn scripted_mode_uses_scripted_gain() {
        let c = controller();
        let inputs = ControlInputs {
            external_temperature: 25.0,
            load: 40.0,
            ..Default::default()
        };
        let out = c
            .compute(Setpoint::C25, OperatingMode::Scripted, &inputs)
            .unwrap();
        assert_eq!(out.gain, 0.45);
        assert!((out.power - 22.5).abs() < 1e-6);
    }

    #[test]
    fn inputs_are_saturated() {
        let c = controller();
        let (e, de) = c.saturate_core_inputs(100.0, -9.0);
        assert_eq!(e, 16.0);
        assert_eq!(de, -2.0);
        let (e, de) = c.saturate_core_inputs(3.0, 0.4);
        assert_eq!((e, de), (3.0, 0.4));
    }

    #[test]
    fn out_of_range_disturbances_are_clamped() {
        let c = controller();
        let (high, _) = c.adjustment(80.0, 250.0).unwrap();
        let (edge, _) = c.adjustment(40.0, 100.0).unwrap();
        assert_eq!(high, edge);
    }

    #[test]
    fn strengths_use_saturated_inputs() {
        let c = controller();
        let inputs = ControlInputs {
            error: 40.0,
            delta_error: 0.0,
            external_temperature: 25.0,
            load: 40.0,
        };
        let (core, compensation) = c.firing_strengths(&inputs).unwrap();
        assert_eq!(core.len(), 25);
        assert_eq!(compensation.len(), 9);
        // PB error x ZE delta
        assert_eq!(core[2 * 5 + 4], 1.0);
        // mild x medium
        assert_eq!(compensation[4], 1.0);
    }

    #[test]
    fn output_is_clipped() {
        assert_eq!(compose(100.0, 0.75, 20.0, 0.0, 100.0), 95.0);
        assert_eq!(compose(100.0, 1.0, 20.0, 0.0, 100.0), 100.0);
        assert_eq!(compose(0.0, 0.56, -20.0, 0.0, 100.0), 0.0);
    }

    #[test]
    fn non_finite_error_rejected() {
        let c = controller();
        let inputs = ControlInputs {
            error: f64::NAN,
            ..Default::default()
        };
        assert!(c.compute(Setpoint::C25, OperatingMode::Dynamic, &inputs).is_err());
    }

    #[test]
    fn invalid_config_rejected() {
        let config = ControllerConfig {
            out_min: 100.0,
            out_max: 0.0,
            ..Default::default()
        };
        assert!(TwoStageController::new(config).is_err());

        let config = ControllerConfig {
            error_bound: 0.0,
            ..Default::default()
        };
        assert!(TwoStageController::new(config).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn composed_power_is_clipped(
            base in -1.0e3_f64..1.0e3,
            gain in -5.0_f64..5.0,
            adjustment in -1.0e3_f64..1.0e3,
        ) {
            let p = compose(base, gain, adjustment, 0.0, 100.0);
            prop_assert!((0.0..=100.0).contains(&p));
        }

        #[test]
        fn controller_power_is_clipped(
            error in -50.0_f64..50.0,
            delta in -10.0_f64..10.0,
            text in -10.0_f64..60.0,
            load in -20.0_f64..150.0,
            sp_idx in 0usize..4,
            scripted in any::<bool>(),
        ) {
            let c = TwoStageController::new(ControllerConfig::default()).unwrap();
            let mode = if scripted { OperatingMode::Scripted } else { OperatingMode::Dynamic };
            let inputs = ControlInputs { error, delta_error: delta, external_temperature: text, load };
            let out = c.compute(Setpoint::ALL[sp_idx], mode, &inputs).unwrap();
            prop_assert!((0.0..=100.0).contains(&out.power));
        }
    }
}
