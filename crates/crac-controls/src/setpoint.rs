//! Discrete setpoints accepted by the CRAC unit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ControlError;

/// Supported room temperature setpoints (degrees Celsius).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub enum Setpoint {
    C16,
    C22,
    #[default]
    C25,
    C32,
}

impl Setpoint {
    pub const ALL: [Setpoint; 4] = [Self::C16, Self::C22, Self::C25, Self::C32];

    pub fn degrees(self) -> i64 {
        match self {
            Self::C16 => 16,
            Self::C22 => 22,
            Self::C25 => 25,
            Self::C32 => 32,
        }
    }

    pub fn celsius(self) -> f64 {
        self.degrees() as f64
    }
}

impl TryFrom<i64> for Setpoint {
    type Error = ControlError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|sp| sp.degrees() == value)
            .ok_or(ControlError::InvalidSetpoint { value })
    }
}

impl From<Setpoint> for i64 {
    fn from(sp: Setpoint) -> Self {
        sp.degrees()
    }
}

impl fmt::Display for Setpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degrees())
    }
}
