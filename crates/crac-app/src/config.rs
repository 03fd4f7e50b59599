//! Application configuration.
//!
//! Every field has a default, so an empty YAML document is a valid config.

use std::path::Path;
use std::time::Duration;

use crac_controls::ControllerConfig;
use crac_sim::{DailyProfile, PlantCoefficients, ThermalPlant};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Bus topic names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Topics {
    /// Outbound state telemetry.
    pub state: String,
    pub setpoint: String,
    pub command: String,
    pub injection: String,
    /// Alerts from an external collaborator; never published by the core.
    pub alert: String,
}

impl Default for Topics {
    fn default() -> Self {
        Self {
            state: "c213/crac/estado".to_string(),
            setpoint: "c213/crac/setpoint".to_string(),
            command: "c213/crac/comando".to_string(),
            injection: "c213/crac/injecao".to_string(),
            alert: "datacenter/fuzzy/alert".to_string(),
        }
    }
}

impl Topics {
    /// Topics the command listener subscribes to.
    pub fn inbound(&self) -> [&str; 3] {
        [&self.setpoint, &self.command, &self.injection]
    }
}

/// Loop sleep intervals in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cadence {
    /// While running.
    pub active_ms: u64,
    /// While stopped.
    pub idle_ms: u64,
    /// Between scripted 24 h ticks.
    pub scripted_ms: u64,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            active_ms: 50,
            idle_ms: 500,
            scripted_ms: 50,
        }
    }
}

impl Cadence {
    /// No sleeping at all; used for offline runs and tests.
    pub fn immediate() -> Self {
        Self {
            active_ms: 0,
            idle_ms: 0,
            scripted_ms: 0,
        }
    }

    pub fn active(&self) -> Duration {
        Duration::from_millis(self.active_ms)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_millis(self.idle_ms)
    }

    pub fn scripted(&self) -> Duration {
        Duration::from_millis(self.scripted_ms)
    }
}

/// Plant model and ambient conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub coefficients: PlantCoefficients,
    /// Temperature restored by a reset.
    pub baseline_temperature: f64,
    /// Thermal load used in dynamic mode.
    pub ambient_load: f64,
    /// External temperature used in dynamic mode.
    pub ambient_external_temperature: f64,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            coefficients: PlantCoefficients::default(),
            baseline_temperature: 25.0,
            ambient_load: 40.0,
            ambient_external_temperature: 25.0,
        }
    }
}

/// Transport-facing limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// How long to wait for the transport to report readiness.
    pub ready_timeout_ms: u64,
    /// Outbound records buffered before publication starts dropping.
    pub queue_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: 5_000,
            queue_capacity: 256,
        }
    }
}

impl BusConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub topics: Topics,
    pub cadence: Cadence,
    pub controller: ControllerConfig,
    pub plant: PlantConfig,
    pub scenario: DailyProfile,
    pub bus: BusConfig,
}

impl AppConfig {
    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_yaml(path: &Path) -> AppResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.controller.validate()?;
        ThermalPlant::new(self.plant.coefficients)?;
        self.scenario.validate()?;
        let ambient = [
            self.plant.baseline_temperature,
            self.plant.ambient_load,
            self.plant.ambient_external_temperature,
        ];
        if ambient.iter().any(|v| !v.is_finite()) {
            return Err(AppError::Config(
                "plant ambient values must be finite".to_string(),
            ));
        }
        if self.bus.queue_capacity == 0 {
            return Err(AppError::Config(
                "bus queue_capacity must be positive".to_string(),
            ));
        }
        let inbound = self.topics.inbound();
        let distinct = inbound
            .iter()
            .enumerate()
            .all(|(i, t)| !inbound[..i].contains(t) && *t != self.topics.state);
        if !distinct {
            return Err(AppError::Config("bus topics must be distinct".to_string()));
        }
        Ok(())
    }
}
