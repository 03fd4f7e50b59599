//! Discrete-time thermal simulation for the CRAC room.
//!
//! Provides:
//! - First-order thermal plant recurrence driven by cooling power
//! - Scripted 24 h disturbance profile (external temperature, thermal load)

pub mod error;
pub mod plant;
pub mod profile;

pub use error::{SimError, SimResult};
pub use plant::{PlantCoefficients, PlantInputs, ThermalPlant};
pub use profile::{DailyProfile, Disturbance};
