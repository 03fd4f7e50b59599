//! Real-time control loop.
//!
//! [`ControlLoop`] owns the controller state, the two-stage controller and
//! the plant. The command listener only produces [`Intent`]s; they are
//! drained at the top of each cycle (and once per scripted tick), so a
//! computation always sees one consistent state.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use crac_controls::{ControlInputs, OperatingMode, Setpoint, TwoStageController};
use crac_sim::{Disturbance, PlantInputs, ThermalPlant};
use tracing::{debug, info, warn};

use crate::bus::TelemetrySink;
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::message::{Command, Intent};
use crate::state::{Action, ControllerState, Effect};
use crate::telemetry::TelemetryRecord;

/// Whether the loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopFlow {
    Continue,
    Shutdown,
}

pub struct ControlLoop<S: TelemetrySink> {
    config: AppConfig,
    controller: TwoStageController,
    plant: ThermalPlant,
    state: ControllerState,
    sink: S,
    intents: Receiver<Intent>,
}

impl<S: TelemetrySink> ControlLoop<S> {
    pub fn new(config: AppConfig, sink: S, intents: Receiver<Intent>) -> AppResult<Self> {
        config.validate()?;
        let controller = TwoStageController::new(config.controller.clone())?;
        let plant = ThermalPlant::new(config.plant.coefficients)?;
        let state = ControllerState::new(Setpoint::default(), config.plant.baseline_temperature);
        Ok(Self {
            config,
            controller,
            plant,
            state,
            sink,
            intents,
        })
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Run cycles until a shutdown intent arrives or every sender is gone.
    pub fn run(&mut self) {
        info!(setpoint = %self.state.setpoint, "control loop started, waiting for start command");
        while self.cycle() == LoopFlow::Continue {}
        info!("control loop stopped");
    }

    /// Drain intents, perform the highest-priority action, publish its
    /// record and sleep for the matching cadence.
    pub fn cycle(&mut self) -> LoopFlow {
        if self.drain_intents() == LoopFlow::Shutdown {
            return LoopFlow::Shutdown;
        }
        let pause = match self.state.next_action() {
            Action::RunScripted => return self.run_scripted(),
            Action::Reset => {
                self.reset();
                self.config.cadence.idle()
            }
            Action::Idle => {
                let record = TelemetryRecord::idle(&self.state, &self.config.plant);
                self.publish(&record);
                self.config.cadence.idle()
            }
            Action::Compute => {
                self.tick();
                self.config.cadence.active()
            }
        };
        pause_for(pause);
        LoopFlow::Continue
    }

    fn drain_intents(&mut self) -> LoopFlow {
        loop {
            match self.intents.try_recv() {
                Ok(intent) => {
                    if self.apply(intent) == LoopFlow::Shutdown {
                        return LoopFlow::Shutdown;
                    }
                }
                Err(TryRecvError::Empty) => return LoopFlow::Continue,
                Err(TryRecvError::Disconnected) => {
                    debug!("intent channel closed");
                    return LoopFlow::Shutdown;
                }
            }
        }
    }

    fn apply(&mut self, intent: Intent) -> LoopFlow {
        match self
            .state
            .apply(intent, self.config.plant.baseline_temperature)
        {
            Effect::None => LoopFlow::Continue,
            Effect::Reset => {
                self.publish_reset();
                LoopFlow::Continue
            }
            Effect::Shutdown => LoopFlow::Shutdown,
        }
    }

    fn reset(&mut self) {
        self.state.reset(self.config.plant.baseline_temperature);
        self.publish_reset();
    }

    fn publish_reset(&mut self) {
        info!(
            temperature = self.state.temperature,
            setpoint = %self.state.setpoint,
            "state reset"
        );
        let record = TelemetryRecord::reset(&self.state, &self.config.plant);
        self.publish(&record);
    }

    /// One live tick; injected values bypass the plant.
    fn tick(&mut self) {
        let plant = &self.config.plant;
        let inputs = if self.state.injecting {
            let injection = self.state.injection;
            self.state.record_error(injection.error);
            ControlInputs {
                error: injection.error,
                delta_error: injection.delta_error,
                external_temperature: injection.external_temperature,
                load: injection.load,
            }
        } else {
            let (error, delta_error) = self.state.advance_error();
            ControlInputs {
                error,
                delta_error,
                external_temperature: plant.ambient_external_temperature,
                load: plant.ambient_load,
            }
        };

        let power = self.control(OperatingMode::Dynamic, &inputs);
        if let Some(power) = power
            && !self.state.injecting
        {
            self.advance_plant(power, &inputs);
        }
        let record = TelemetryRecord::tick(&self.state, &inputs, power.unwrap_or(0.0));
        self.publish(&record);
    }

    /// Run the compressed day. Ends stopped with the scripted flag cleared.
    pub fn run_scripted(&mut self) -> LoopFlow {
        let profile = self.config.scenario.clone();
        info!(ticks = profile.ticks, "scripted 24 h cycle started");
        self.state.scripted_requested = false;
        self.state.scripted_running = true;
        self.reset();

        let mut deferred = Vec::new();
        let mut flow = LoopFlow::Continue;
        for disturbance in profile.iter() {
            if self.drain_during_scripted(&mut deferred) == LoopFlow::Shutdown {
                info!(tick = disturbance.tick, "scripted cycle cancelled");
                flow = LoopFlow::Shutdown;
                break;
            }
            self.scripted_tick(&disturbance);
            pause_for(self.config.cadence.scripted());
        }

        self.state.scripted_running = false;
        self.state.running = false;
        if flow == LoopFlow::Continue {
            info!("scripted 24 h cycle finished");
            for intent in deferred {
                if self.apply(intent) == LoopFlow::Shutdown {
                    return LoopFlow::Shutdown;
                }
            }
        }
        flow
    }

    /// Setpoint changes apply at once; other intents wait for the cycle end.
    fn drain_during_scripted(&mut self, deferred: &mut Vec<Intent>) -> LoopFlow {
        loop {
            match self.intents.try_recv() {
                Ok(Intent::Shutdown) => return LoopFlow::Shutdown,
                Ok(intent @ Intent::SetSetpoint(_)) => {
                    self.apply(intent);
                }
                Ok(Intent::Command(Command::StartScripted)) => {
                    debug!("scripted cycle already running");
                }
                Ok(intent) => deferred.push(intent),
                Err(TryRecvError::Empty) => return LoopFlow::Continue,
                Err(TryRecvError::Disconnected) => return LoopFlow::Shutdown,
            }
        }
    }

    fn scripted_tick(&mut self, disturbance: &Disturbance) {
        let (error, delta_error) = self.state.advance_error();
        let inputs = ControlInputs {
            error,
            delta_error,
            external_temperature: disturbance.external_temperature,
            load: disturbance.load,
        };
        let power = self.control(OperatingMode::Scripted, &inputs);
        if let Some(power) = power {
            self.advance_plant(power, &inputs);
        }
        let record = TelemetryRecord::scripted(
            &self.state,
            &inputs,
            power.unwrap_or(0.0),
            disturbance.hours,
        );
        self.publish(&record);
    }

    fn control(&self, mode: OperatingMode, inputs: &ControlInputs) -> Option<f64> {
        match self.controller.compute(self.state.setpoint, mode, inputs) {
            Ok(out) => Some(out.power),
            Err(err) => {
                warn!(%err, "control tick failed, holding plant");
                None
            }
        }
    }

    fn advance_plant(&mut self, power: f64, inputs: &ControlInputs) {
        self.state.temperature = self.plant.step(
            self.state.temperature,
            &PlantInputs {
                power,
                load: inputs.load,
                external_temperature: inputs.external_temperature,
            },
        );
    }

    fn publish(&mut self, record: &TelemetryRecord) {
        if let Err(err) = self.sink.publish(&self.config.topics.state, record) {
            warn!(%err, "dropping telemetry record");
        }
    }
}

fn pause_for(interval: Duration) {
    if !interval.is_zero() {
        thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::MemorySink;
    use crate::config::Cadence;
    use crate::message::Injection;
    use std::sync::mpsc::{self, Sender};

    fn fixture() -> (ControlLoop<MemorySink>, Sender<Intent>, MemorySink) {
        let config = AppConfig {
            cadence: Cadence::immediate(),
            ..Default::default()
        };
        let sink = MemorySink::new();
        let (tx, rx) = mpsc::channel();
        let control = ControlLoop::new(config, sink.clone(), rx).unwrap();
        (control, tx, sink)
    }

    #[test]
    fn stopped_loop_publishes_idle_records() {
        let (mut control, _tx, sink) = fixture();
        for _ in 0..3 {
            assert_eq!(control.cycle(), LoopFlow::Continue);
        }
        let records = sink.records();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|(topic, r)| topic == "c213/crac/estado"
            && !r.running
            && r.power == 0.0
            && r.temperature == 25.0));
    }

    #[test]
    fn running_loop_moves_temperature() {
        let (mut control, tx, sink) = fixture();
        tx.send(Intent::SetSetpoint(Setpoint::C16)).unwrap();
        tx.send(Intent::Command(Command::Start)).unwrap();
        for _ in 0..20 {
            control.cycle();
        }
        let last = sink.records().last().unwrap().1.clone();
        assert!(last.running);
        assert!(last.power > 0.0);
        assert!(last.temperature < 25.0, "temperature = {}", last.temperature);
    }

    #[test]
    fn injected_tick_holds_temperature() {
        let (mut control, tx, sink) = fixture();
        tx.send(Intent::Inject(Injection {
            error: 4.0,
            delta_error: 0.5,
            external_temperature: 35.0,
            load: 90.0,
        }))
        .unwrap();
        tx.send(Intent::Command(Command::Start)).unwrap();
        control.cycle();
        let record = sink.records().last().unwrap().1.clone();
        assert!(record.injecting);
        assert_eq!(record.error, 4.0);
        assert_eq!(record.load, 90.0);
        assert_eq!(control.state().temperature, 25.0);
    }

    #[test]
    fn shutdown_intent_stops_cycle() {
        let (mut control, tx, _sink) = fixture();
        tx.send(Intent::Shutdown).unwrap();
        assert_eq!(control.cycle(), LoopFlow::Shutdown);
    }

    #[test]
    fn closed_channel_stops_run() {
        let (mut control, tx, sink) = fixture();
        drop(tx);
        control.run();
        assert!(sink.is_empty());
    }
}
