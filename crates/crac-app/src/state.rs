//! Controller state and its transition table.
//!
//! The control loop is the only owner of [`ControllerState`]. Inbound
//! intents are applied with [`ControllerState::apply`]; once per cycle the
//! loop asks [`ControllerState::next_action`] what to do, in priority order:
//!
//! | priority | condition                                   | action        |
//! |----------|---------------------------------------------|---------------|
//! | 1        | scripted cycle requested and not running    | `RunScripted` |
//! | 2        | reset pending                               | `Reset`       |
//! | 3        | not running                                 | `Idle`        |
//! | 4        | otherwise                                   | `Compute`     |

use crac_controls::Setpoint;
use tracing::{debug, info};

use crate::message::{Command, Injection, Intent};

/// What the loop should do this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RunScripted,
    Reset,
    Idle,
    Compute,
}

/// Side effect the loop must carry out after applying an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// State was reset; a reset record must be published.
    Reset,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub setpoint: Setpoint,
    pub temperature: f64,
    /// Most recent error `T - sp`.
    pub last_error: f64,
    /// Error stored one tick before `last_error`.
    pub previous_error: f64,
    pub running: bool,
    pub injecting: bool,
    pub injection: Injection,
    pub reset_pending: bool,
    pub scripted_requested: bool,
    pub scripted_running: bool,
}

impl ControllerState {
    /// Stopped state at `temperature` with a settled error history.
    pub fn new(setpoint: Setpoint, temperature: f64) -> Self {
        let error = temperature - setpoint.celsius();
        Self {
            setpoint,
            temperature,
            last_error: error,
            previous_error: error,
            running: false,
            injecting: false,
            injection: Injection::default(),
            reset_pending: false,
            scripted_requested: false,
            scripted_running: false,
        }
    }

    pub fn next_action(&self) -> Action {
        if self.scripted_requested && !self.scripted_running {
            Action::RunScripted
        } else if self.reset_pending {
            Action::Reset
        } else if !self.running {
            Action::Idle
        } else {
            Action::Compute
        }
    }

    /// Return to `baseline`, stopped and without injection.
    pub fn reset(&mut self, baseline: f64) {
        self.temperature = baseline;
        self.last_error = baseline - self.setpoint.celsius();
        self.previous_error = self.last_error;
        self.injecting = false;
        self.running = false;
        self.reset_pending = false;
    }

    pub fn apply(&mut self, intent: Intent, baseline: f64) -> Effect {
        match intent {
            Intent::SetSetpoint(setpoint) => {
                info!(%setpoint, "setpoint updated");
                self.setpoint = setpoint;
                Effect::None
            }
            Intent::Command(command) => self.apply_command(command, baseline),
            Intent::Inject(injection) => {
                info!(?injection, "injection received, run paused");
                self.injection = injection;
                self.injecting = true;
                self.running = false;
                Effect::None
            }
            Intent::Shutdown => Effect::Shutdown,
        }
    }

    fn apply_command(&mut self, command: Command, baseline: f64) -> Effect {
        debug!(command = command.as_str(), "applying command");
        match command {
            Command::Start => {
                let effect = if self.reset_pending {
                    self.reset(baseline);
                    Effect::Reset
                } else {
                    Effect::None
                };
                self.running = true;
                effect
            }
            Command::Stop => {
                self.running = false;
                Effect::None
            }
            Command::ClearGraph => {
                self.reset_pending = true;
                Effect::None
            }
            Command::StartScripted => {
                if !self.scripted_running {
                    self.scripted_requested = true;
                }
                Effect::None
            }
        }
    }

    /// Error and delta error for a closed-loop tick.
    ///
    /// Delta error is the difference of the two stored errors, so it lags
    /// the fresh error by one tick. The history then shifts.
    pub fn advance_error(&mut self) -> (f64, f64) {
        let error = self.temperature - self.setpoint.celsius();
        let delta_error = self.last_error - self.previous_error;
        self.record_error(error);
        (error, delta_error)
    }

    /// Push `error` into the history.
    pub fn record_error(&mut self, error: f64) {
        self.previous_error = self.last_error;
        self.last_error = error;
    }
}
