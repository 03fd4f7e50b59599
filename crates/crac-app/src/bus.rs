//! Seam between the control loop and the message transport.
//!
//! The transport used here frames one [`BusFrame`] per line of JSON:
//! `{"topic": "c213/crac/setpoint", "payload": {"setpoint": 22}}`.
//! Publication goes through a bounded queue drained by a writer thread, so
//! a slow consumer never blocks a tick.

use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Topics;
use crate::error::{AppError, AppResult};
use crate::message::{Intent, decode_value};
use crate::telemetry::TelemetryRecord;

#[derive(Error, Debug)]
pub enum BusError {
    #[error("Outbound queue full")]
    QueueFull,

    #[error("Outbound queue closed")]
    Closed,

    #[error("Publisher worker panicked")]
    WorkerPanicked,

    #[error("Encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One message on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusFrame {
    pub topic: String,
    pub payload: serde_json::Value,
}

/// Destination for telemetry records.
///
/// Implementations must not block for long; the loop logs and drops on error.
pub trait TelemetrySink {
    fn publish(&mut self, topic: &str, record: &TelemetryRecord) -> Result<(), BusError>;
}

/// Bounded, non-blocking publisher writing frames from a worker thread.
pub struct QueuedPublisher {
    tx: SyncSender<BusFrame>,
    worker: JoinHandle<()>,
}

impl QueuedPublisher {
    pub fn spawn<W: Write + Send + 'static>(writer: W, capacity: usize) -> Self {
        let (tx, rx) = mpsc::sync_channel(capacity);
        let worker = thread::spawn(move || write_frames(writer, rx));
        Self { tx, worker }
    }

    /// Flush everything queued so far and stop the worker.
    pub fn close(self) -> Result<(), BusError> {
        let Self { tx, worker } = self;
        drop(tx);
        worker.join().map_err(|_| BusError::WorkerPanicked)
    }
}

fn write_frames<W: Write>(mut writer: W, rx: Receiver<BusFrame>) {
    for frame in rx {
        let written = serde_json::to_writer(&mut writer, &frame)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(writer))
            .and_then(|()| writer.flush());
        if let Err(err) = written {
            warn!(topic = %frame.topic, %err, "failed to write frame");
        }
    }
}

impl TelemetrySink for QueuedPublisher {
    fn publish(&mut self, topic: &str, record: &TelemetryRecord) -> Result<(), BusError> {
        let frame = BusFrame {
            topic: topic.to_string(),
            payload: serde_json::to_value(record)?,
        };
        self.tx.try_send(frame).map_err(|err| match err {
            TrySendError::Full(_) => BusError::QueueFull,
            TrySendError::Disconnected(_) => BusError::Closed,
        })
    }
}

/// Records everything in memory; cloned handles share the same log.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<(String, TelemetryRecord)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(String, TelemetryRecord)> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TelemetrySink for MemorySink {
    fn publish(&mut self, topic: &str, record: &TelemetryRecord) -> Result<(), BusError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((topic.to_string(), record.clone()));
        Ok(())
    }
}

/// Notifies that the transport is connected and subscribed.
#[derive(Debug)]
pub struct ReadySignal(Sender<()>);

impl ReadySignal {
    pub fn notify(self) {
        // The waiter may already have timed out.
        self.0.send(()).ok();
    }
}

#[derive(Debug)]
pub struct ReadyWaiter(Receiver<()>);

impl ReadyWaiter {
    /// Block until ready or until `timeout` elapses.
    pub fn wait(self, timeout: Duration) -> AppResult<()> {
        self.0
            .recv_timeout(timeout)
            .map_err(|_| AppError::BusNotReady {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
    }
}

pub fn readiness() -> (ReadySignal, ReadyWaiter) {
    let (tx, rx) = mpsc::channel();
    (ReadySignal(tx), ReadyWaiter(rx))
}

/// Read frames line by line and forward decoded intents.
///
/// Signals readiness once the reader is being consumed. Malformed frames and
/// payloads are logged and skipped. End of input sends [`Intent::Shutdown`].
pub fn spawn_listener<R: BufRead + Send + 'static>(
    reader: R,
    topics: Topics,
    intents: Sender<Intent>,
    ready: ReadySignal,
) -> JoinHandle<()> {
    thread::spawn(move || {
        ready.notify();
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(%err, "inbound stream failed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let frame: BusFrame = match serde_json::from_str(&line) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(%err, "discarding malformed frame");
                    continue;
                }
            };
            match decode_value(&topics, &frame.topic, &frame.payload) {
                Ok(Some(intent)) => {
                    if intents.send(intent).is_err() {
                        return;
                    }
                }
                Ok(None) => debug!(topic = %frame.topic, "ignoring foreign topic"),
                Err(err) => warn!(topic = %frame.topic, %err, "discarding message"),
            }
        }
        intents.send(Intent::Shutdown).ok();
    })
}
