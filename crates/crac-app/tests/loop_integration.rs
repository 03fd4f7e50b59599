use std::sync::mpsc::{self, Sender};

use crac_app::{
    AppConfig, BusError, Cadence, Command, ControlLoop, Injection, Intent, LoopFlow, MemorySink,
    TelemetryRecord, TelemetrySink,
};
use crac_controls::Setpoint;

fn config() -> AppConfig {
    AppConfig {
        cadence: Cadence::immediate(),
        ..Default::default()
    }
}

fn setup() -> (ControlLoop<MemorySink>, Sender<Intent>, MemorySink) {
    let sink = MemorySink::new();
    let (tx, rx) = mpsc::channel();
    let control = ControlLoop::new(config(), sink.clone(), rx).unwrap();
    (control, tx, sink)
}

fn records(sink: &MemorySink) -> Vec<TelemetryRecord> {
    sink.records().into_iter().map(|(_, r)| r).collect()
}

/// Records like a [`MemorySink`] and injects intents after a given number
/// of publications, standing in for a listener firing mid-cycle.
struct TriggerSink {
    inner: MemorySink,
    tx: Sender<Intent>,
    after: usize,
    intents: Vec<Intent>,
}

impl TelemetrySink for TriggerSink {
    fn publish(&mut self, topic: &str, record: &TelemetryRecord) -> Result<(), BusError> {
        self.inner.publish(topic, record)?;
        if self.inner.len() == self.after {
            for intent in self.intents.drain(..) {
                self.tx.send(intent).unwrap();
            }
        }
        Ok(())
    }
}

struct FailingSink {
    attempts: usize,
}

impl TelemetrySink for FailingSink {
    fn publish(&mut self, _topic: &str, _record: &TelemetryRecord) -> Result<(), BusError> {
        self.attempts += 1;
        Err(BusError::QueueFull)
    }
}

#[test]
fn scripted_day_publishes_reset_then_every_tick() {
    let (mut control, tx, sink) = setup();
    tx.send(Intent::Command(Command::StartScripted)).unwrap();
    assert_eq!(control.cycle(), LoopFlow::Continue);

    let records = records(&sink);
    assert_eq!(records.len(), 289);
    assert!(records[0].is_reset());
    let ticks = &records[1..];
    assert!(ticks.iter().all(|r| r.running && !r.injecting && !r.is_reset()));
    assert_eq!(ticks[0].elapsed_hours, Some(0.0));
    assert_eq!(ticks[287].elapsed_hours, Some(23.92));
    assert!(ticks.iter().all(|r| (0.0..=100.0).contains(&r.power)));
    assert_eq!(ticks[100].load, 90.0);
    assert_eq!(ticks[0].load, 30.0);

    let state = control.state();
    assert!(!state.scripted_running);
    assert!(!state.scripted_requested);
    assert!(!state.running);

    // Back to idle afterwards.
    control.cycle();
    let last = sink.records().last().unwrap().1.clone();
    assert!(!last.running);
    assert_eq!(last.elapsed_hours, None);
}

#[test]
fn scripted_day_applies_setpoint_at_once_and_defers_commands() {
    let sink = MemorySink::new();
    let (tx, rx) = mpsc::channel();
    let trigger = TriggerSink {
        inner: sink.clone(),
        tx: tx.clone(),
        after: 10,
        intents: vec![
            Intent::SetSetpoint(Setpoint::C22),
            Intent::Command(Command::Start),
            Intent::Command(Command::StartScripted),
        ],
    };
    let mut control = ControlLoop::new(config(), trigger, rx).unwrap();
    tx.send(Intent::Command(Command::StartScripted)).unwrap();
    control.cycle();

    let records = records(&sink);
    assert_eq!(records.len(), 289);
    assert_eq!(records[5].setpoint, Setpoint::C25);
    assert_eq!(records[11].setpoint, Setpoint::C22);
    let state = control.state();
    assert!(state.running, "deferred start applies after the cycle");
    assert!(!state.scripted_requested);
    assert!(!state.scripted_running);
}

#[test]
fn shutdown_cancels_scripted_day() {
    let sink = MemorySink::new();
    let (tx, rx) = mpsc::channel();
    let trigger = TriggerSink {
        inner: sink.clone(),
        tx: tx.clone(),
        after: 50,
        intents: vec![Intent::Shutdown],
    };
    let mut control = ControlLoop::new(config(), trigger, rx).unwrap();
    tx.send(Intent::Command(Command::StartScripted)).unwrap();
    assert_eq!(control.cycle(), LoopFlow::Shutdown);
    assert_eq!(sink.len(), 50);
    assert!(!control.state().scripted_running);
}

#[test]
fn injection_never_advances_the_plant() {
    let (mut control, tx, sink) = setup();
    tx.send(Intent::Command(Command::Start)).unwrap();
    for _ in 0..5 {
        control.cycle();
    }
    let before = control.state().temperature;
    tx.send(Intent::Inject(Injection {
        error: -6.0,
        delta_error: 1.2,
        external_temperature: 38.0,
        load: 95.0,
    }))
    .unwrap();
    tx.send(Intent::Command(Command::Start)).unwrap();
    for _ in 0..10 {
        control.cycle();
        assert_eq!(control.state().temperature, before);
    }
    let last = sink.records().last().unwrap().1.clone();
    assert!(last.injecting && last.running);
    assert_eq!(last.error, -6.0);
    assert_eq!(last.delta_error, 1.2);
}

#[test]
fn injection_pauses_a_running_loop() {
    let (mut control, tx, sink) = setup();
    tx.send(Intent::Command(Command::Start)).unwrap();
    control.cycle();
    tx.send(Intent::Inject(Injection::default())).unwrap();
    control.cycle();
    let last = sink.records().last().unwrap().1.clone();
    assert!(!last.running);
    assert!(last.injecting);
    assert_eq!(last.power, 0.0);
}

#[test]
fn clear_graph_then_idle_then_start_matches_fresh_run() {
    let (mut fresh, fresh_tx, fresh_sink) = setup();
    fresh_tx.send(Intent::Command(Command::Start)).unwrap();
    for _ in 0..15 {
        fresh.cycle();
    }
    let expected = records(&fresh_sink);

    let (mut control, tx, sink) = setup();
    tx.send(Intent::Inject(Injection {
        error: 3.0,
        ..Default::default()
    }))
    .unwrap();
    tx.send(Intent::Command(Command::Start)).unwrap();
    for _ in 0..7 {
        control.cycle();
    }
    tx.send(Intent::Command(Command::Stop)).unwrap();
    tx.send(Intent::Command(Command::ClearGraph)).unwrap();
    control.cycle();
    assert!(sink.records().last().unwrap().1.is_reset());
    for _ in 0..4 {
        control.cycle();
    }
    let skip = sink.len();
    tx.send(Intent::Command(Command::Start)).unwrap();
    for _ in 0..15 {
        control.cycle();
    }
    let after: Vec<TelemetryRecord> = records(&sink).into_iter().skip(skip).collect();
    assert_eq!(after, expected);
}

#[test]
fn start_with_pending_reset_publishes_reset_first() {
    let (mut control, tx, sink) = setup();
    tx.send(Intent::Command(Command::ClearGraph)).unwrap();
    tx.send(Intent::Command(Command::Start)).unwrap();
    control.cycle();
    let records = records(&sink);
    assert_eq!(records.len(), 2);
    assert!(records[0].is_reset());
    assert!(records[1].running);
}

#[test]
fn invalid_setpoint_payloads_leave_setpoint_alone() {
    let (mut control, tx, _sink) = setup();
    let topics = control.config().topics.clone();
    for payload in [
        r#"{"setpoint": 30}"#,
        r#"{"setpoint": "abc"}"#,
        r#"{"setpoint": null}"#,
        "{",
    ] {
        if let Ok(Some(intent)) = crac_app::decode(&topics, &topics.setpoint, payload.as_bytes()) {
            tx.send(intent).unwrap();
        }
    }
    control.cycle();
    assert_eq!(control.state().setpoint, Setpoint::C25);
}

#[test]
fn failing_sink_does_not_stall_the_loop() {
    let (tx, rx) = mpsc::channel();
    let mut control = ControlLoop::new(config(), FailingSink { attempts: 0 }, rx).unwrap();
    tx.send(Intent::SetSetpoint(Setpoint::C16)).unwrap();
    tx.send(Intent::Command(Command::Start)).unwrap();
    for _ in 0..10 {
        assert_eq!(control.cycle(), LoopFlow::Continue);
    }
    assert!(control.state().temperature < 25.0);
    assert_eq!(control.into_sink().attempts, 10);
}
