//! Setpoint-scheduled proportional gain.
//!
//! The base power from the core stage is attenuated by a gain chosen from a
//! lookup table keyed by setpoint. Two tables exist: one tuned for live
//! dynamic operation, one for the scripted 24 h scenario.

use std::collections::BTreeMap;

use crac_core::ensure_finite;
use serde::{Deserialize, Serialize};

use crate::error::ControlResult;
use crate::setpoint::Setpoint;

/// Gain used when a setpoint has no table entry.
pub const DEFAULT_GAIN: f64 = 0.35;

/// Which gain table applies to a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Live closed-loop (or injected) operation.
    #[default]
    Dynamic,
    /// Scripted 24 h scenario.
    Scripted,
}

/// Lookup table `setpoint -> Kp` with a fallback gain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GainSchedule {
    pub gains: BTreeMap<Setpoint, f64>,
    #[serde(default = "default_gain")]
    pub default_gain: f64,
}

fn default_gain() -> f64 {
    DEFAULT_GAIN
}

impl GainSchedule {
    pub fn new(entries: impl IntoIterator<Item = (Setpoint, f64)>, default_gain: f64) -> Self {
        Self {
            gains: entries.into_iter().collect(),
            default_gain,
        }
    }

    /// Table tuned for live operation.
    pub fn dynamic() -> Self {
        Self::new(
            [
                (Setpoint::C16, 0.56),
                (Setpoint::C22, 0.28),
                (Setpoint::C25, 0.09),
                (Setpoint::C32, 0.01),
            ],
            DEFAULT_GAIN,
        )
    }

    /// Table tuned for the scripted 24 h scenario.
    pub fn scripted() -> Self {
        Self::new(
            [
                (Setpoint::C16, 0.75),
                (Setpoint::C22, 0.45),
                (Setpoint::C25, 0.45),
                (Setpoint::C32, 0.3),
            ],
            DEFAULT_GAIN,
        )
    }

    pub fn gain(&self, setpoint: Setpoint) -> f64 {
        self.gains
            .get(&setpoint)
            .copied()
            .unwrap_or(self.default_gain)
    }

    pub fn validate(&self) -> ControlResult<()> {
        ensure_finite(self.default_gain, "default gain")?;
        for gain in self.gains.values() {
            ensure_finite(*gain, "scheduled gain")?;
        }
        Ok(())
    }
}
