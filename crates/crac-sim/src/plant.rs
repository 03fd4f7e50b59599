//! First-order thermal plant.
//!
//! Recurrence: `T[n+1] = a*T[n] - b*P + c*Q + d*Text + e`, where `P` is the
//! commanded cooling power, `Q` the thermal load and `Text` the external
//! temperature.

use crac_core::ensure_finite;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Fixed recurrence coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantCoefficients {
    /// Retention of the previous temperature.
    pub a: f64,
    /// Cooling effect per unit power.
    pub b: f64,
    /// Heating effect per unit load.
    pub c: f64,
    /// Coupling to external temperature.
    pub d: f64,
    /// Constant offset.
    pub e: f64,
}

impl Default for PlantCoefficients {
    fn default() -> Self {
        Self {
            a: 0.9,
            b: 0.08,
            c: 0.05,
            d: 0.02,
            e: 0.35,
        }
    }
}

/// Disturbances and command applied for one step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlantInputs {
    pub power: f64,
    pub load: f64,
    pub external_temperature: f64,
}

/// Room temperature model.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThermalPlant {
    coefficients: PlantCoefficients,
}

impl ThermalPlant {
    /// Create a plant.
    ///
    /// # Errors
    ///
    /// Returns error if a coefficient is non-finite or `a` lies outside `[0, 1)`
    /// (the recurrence would not settle).
    pub fn new(coefficients: PlantCoefficients) -> SimResult<Self> {
        let PlantCoefficients { a, b, c, d, e } = coefficients;
        ensure_finite(a, "plant a")?;
        ensure_finite(b, "plant b")?;
        ensure_finite(c, "plant c")?;
        ensure_finite(d, "plant d")?;
        ensure_finite(e, "plant e")?;
        if !(0.0..1.0).contains(&a) {
            return Err(SimError::InvalidArg {
                what: "plant retention a must lie in [0, 1)",
            });
        }
        Ok(Self { coefficients })
    }

    pub fn coefficients(&self) -> &PlantCoefficients {
        &self.coefficients
    }

    /// Advance the room temperature by one tick.
    pub fn step(&self, temperature: f64, inputs: &PlantInputs) -> f64 {
        let k = &self.coefficients;
        k.a * temperature - k.b * inputs.power + k.c * inputs.load + k.d * inputs.external_temperature
            + k.e
    }
}
