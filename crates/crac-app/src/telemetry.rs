//! Outbound state record.
//!
//! Field names follow the dashboard's wire schema. Values are rounded when
//! the record is built: temperatures, errors and power to 2 decimals, load
//! and external temperature to 1.

use crac_controls::{ControlInputs, Setpoint};
use crac_core::round_to;
use serde::{Deserialize, Serialize};

use crate::config::PlantConfig;
use crate::state::ControllerState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    #[serde(rename = "temperatura")]
    pub temperature: f64,
    #[serde(rename = "erro")]
    pub error: f64,
    #[serde(rename = "varErro")]
    pub delta_error: f64,
    #[serde(rename = "potencia")]
    pub power: f64,
    pub setpoint: Setpoint,
    #[serde(rename = "qest")]
    pub load: f64,
    #[serde(rename = "text")]
    pub external_temperature: f64,
    #[serde(rename = "simulacao_rodando")]
    pub running: bool,
    #[serde(rename = "injecao_ativa")]
    pub injecting: bool,
    /// Present only on the record following a reset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset: Option<bool>,
    /// Simulated elapsed hours; scripted cycle only.
    #[serde(
        rename = "tempo_horas",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub elapsed_hours: Option<f64>,
}

impl TelemetryRecord {
    fn held(state: &ControllerState, plant: &PlantConfig) -> Self {
        Self {
            temperature: round_to(state.temperature, 2),
            error: 0.0,
            delta_error: 0.0,
            power: 0.0,
            setpoint: state.setpoint,
            load: round_to(plant.ambient_load, 1),
            external_temperature: round_to(plant.ambient_external_temperature, 1),
            running: state.running,
            injecting: state.injecting,
            reset: None,
            elapsed_hours: None,
        }
    }

    /// Stopped: temperature held, zero outputs, ambient disturbances.
    pub fn idle(state: &ControllerState, plant: &PlantConfig) -> Self {
        Self {
            running: false,
            ..Self::held(state, plant)
        }
    }

    /// Marks a reset so consumers can clear their history.
    pub fn reset(state: &ControllerState, plant: &PlantConfig) -> Self {
        Self {
            running: false,
            injecting: false,
            reset: Some(true),
            ..Self::held(state, plant)
        }
    }

    /// One computed tick, live or injected.
    pub fn tick(state: &ControllerState, inputs: &ControlInputs, power: f64) -> Self {
        Self {
            temperature: round_to(state.temperature, 2),
            error: round_to(inputs.error, 2),
            delta_error: round_to(inputs.delta_error, 2),
            power: round_to(power, 2),
            setpoint: state.setpoint,
            load: round_to(inputs.load, 1),
            external_temperature: round_to(inputs.external_temperature, 1),
            running: state.running,
            injecting: state.injecting,
            reset: None,
            elapsed_hours: None,
        }
    }

    /// One tick of the scripted day.
    pub fn scripted(
        state: &ControllerState,
        inputs: &ControlInputs,
        power: f64,
        hours: f64,
    ) -> Self {
        Self {
            running: true,
            injecting: false,
            elapsed_hours: Some(round_to(hours, 2)),
            ..Self::tick(state, inputs, power)
        }
    }

    pub fn is_reset(&self) -> bool {
        self.reset == Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn idle_record_wire_shape() {
        let mut state = ControllerState::new(Setpoint::C22, 24.567);
        state.running = true;
        let record = TelemetryRecord::idle(&state, &PlantConfig::default());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "temperatura": 24.57,
                "erro": 0.0,
                "varErro": 0.0,
                "potencia": 0.0,
                "setpoint": 22,
                "qest": 40.0,
                "text": 25.0,
                "simulacao_rodando": false,
                "injecao_ativa": false,
            })
        );
    }

    #[test]
    fn reset_record_carries_marker() {
        let state = ControllerState::new(Setpoint::C25, 25.0);
        let record = TelemetryRecord::reset(&state, &PlantConfig::default());
        assert!(record.is_reset());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["reset"], Value::Bool(true));
        assert!(value.get("tempo_horas").is_none());
    }

    #[test]
    fn scripted_record_rounds_fields() {
        let state = ControllerState::new(Setpoint::C16, 23.456);
        let inputs = ControlInputs {
            error: 7.456,
            delta_error: -0.123,
            external_temperature: 31.26,
            load: 90.0,
        };
        let record = TelemetryRecord::scripted(&state, &inputs, 61.239, 13.916_666);
        assert_eq!(record.error, 7.46);
        assert_eq!(record.delta_error, -0.12);
        assert_eq!(record.power, 61.24);
        assert_eq!(record.external_temperature, 31.3);
        assert_eq!(record.elapsed_hours, Some(13.92));
        assert!(record.running);

        let text = serde_json::to_string(&record).unwrap();
        let back: TelemetryRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(back, record);
    }
}
