//! Inbound bus messages.
//!
//! Payloads are flat JSON objects:
//! - setpoint: `{"setpoint": 25}`
//! - command: `{"comando": "iniciar" | "parar" | "limpar_grafico" | "iniciar_24h"}`
//! - injection: `{"erro": .., "deltaErro": .., "text": .., "carga": ..}`
//!
//! Numbers may arrive as JSON numbers or numeric strings. Setpoints are
//! truncated toward zero before being matched against the fixed set.

use crac_controls::Setpoint;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::Topics;

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("Missing field: {field}")]
    MissingField { field: &'static str },

    #[error("Field {field} is not a finite number: {value}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Setpoint {value} is not one of 16, 22, 25, 32")]
    InvalidSetpoint { value: i64 },

    #[error("Unknown command: {command}")]
    UnknownCommand { command: String },
}

/// Operator commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    ClearGraph,
    StartScripted,
}

impl Command {
    pub fn parse(word: &str) -> Result<Self, MessageError> {
        match word {
            "iniciar" => Ok(Self::Start),
            "parar" => Ok(Self::Stop),
            "limpar_grafico" => Ok(Self::ClearGraph),
            "iniciar_24h" => Ok(Self::StartScripted),
            other => Err(MessageError::UnknownCommand {
                command: other.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "iniciar",
            Self::Stop => "parar",
            Self::ClearGraph => "limpar_grafico",
            Self::StartScripted => "iniciar_24h",
        }
    }
}

/// Operator-supplied override values for static analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Injection {
    pub error: f64,
    pub delta_error: f64,
    pub external_temperature: f64,
    pub load: f64,
}

impl Default for Injection {
    fn default() -> Self {
        Self {
            error: 0.0,
            delta_error: 0.0,
            external_temperature: 25.0,
            load: 40.0,
        }
    }
}

/// Everything the listener can ask of the control loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    SetSetpoint(Setpoint),
    Command(Command),
    Inject(Injection),
    /// The inbound stream ended or the process is stopping.
    Shutdown,
}

/// Decode a raw payload received on `topic`.
///
/// Returns `Ok(None)` for topics the controller does not consume.
pub fn decode(topics: &Topics, topic: &str, payload: &[u8]) -> Result<Option<Intent>, MessageError> {
    if !topics.inbound().contains(&topic) {
        return Ok(None);
    }
    let value: Value = serde_json::from_slice(payload)?;
    decode_value(topics, topic, &value)
}

/// Decode an already parsed payload received on `topic`.
pub fn decode_value(
    topics: &Topics,
    topic: &str,
    payload: &Value,
) -> Result<Option<Intent>, MessageError> {
    let object = payload.as_object().ok_or(MessageError::NotAnObject)?;
    if topic == topics.setpoint {
        let raw = number(object, "setpoint")?;
        let value = raw.trunc() as i64;
        let setpoint =
            Setpoint::try_from(value).map_err(|_| MessageError::InvalidSetpoint { value })?;
        Ok(Some(Intent::SetSetpoint(setpoint)))
    } else if topic == topics.command {
        let word = match object.get("comando") {
            Some(Value::String(word)) => word.as_str(),
            Some(other) => {
                return Err(MessageError::UnknownCommand {
                    command: other.to_string(),
                });
            }
            None => return Err(MessageError::MissingField { field: "comando" }),
        };
        Ok(Some(Intent::Command(Command::parse(word)?)))
    } else if topic == topics.injection {
        Ok(Some(Intent::Inject(Injection {
            error: number(object, "erro")?,
            delta_error: number(object, "deltaErro")?,
            external_temperature: number(object, "text")?,
            load: number(object, "carga")?,
        })))
    } else {
        Ok(None)
    }
}

fn number(object: &Map<String, Value>, field: &'static str) -> Result<f64, MessageError> {
    let value = object
        .get(field)
        .ok_or(MessageError::MissingField { field })?;
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| MessageError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}
