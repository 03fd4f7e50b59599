//! Application layer for the CRAC fuzzy controller.
//!
//! Ties the control law and thermal plant into a real-time loop driven by
//! bus messages:
//! - [`message`] decodes inbound setpoint/command/injection payloads into intents
//! - [`state`] holds the controller state and its transition table
//! - [`control_loop`] is the single owner of that state and runs the ticks
//! - [`telemetry`] encodes the outbound state record
//! - [`bus`] is the seam to the transport (publisher, readiness, stdio framing)
//! - [`config`] gathers every tunable into one YAML document

pub mod bus;
pub mod config;
pub mod control_loop;
pub mod error;
pub mod message;
pub mod state;
pub mod telemetry;

pub use bus::{
    BusError, BusFrame, MemorySink, QueuedPublisher, ReadySignal, ReadyWaiter, TelemetrySink,
    readiness, spawn_listener,
};
pub use config::{AppConfig, BusConfig, Cadence, PlantConfig, Topics};
pub use control_loop::{ControlLoop, LoopFlow};
pub use error::{AppError, AppResult};
pub use message::{Command, Injection, Intent, MessageError, decode, decode_value};
pub use state::{Action, ControllerState, Effect};
pub use telemetry::TelemetryRecord;
