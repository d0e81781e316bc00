//! Lifecycle handle for a bootstrapped engine instance

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::device::{Device, LogSink};

const STATE_CREATED: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_STOPPED: u8 = 2;

/// Control handle returned by [`crate::setup`].
///
/// Owns the device and the engine-internal worker state. `start` and
/// `stop` are each expected to be called exactly once, in that order;
/// repeat calls are ignored. Only the component that owns the handle may
/// drive the lifecycle.
pub struct Control {
    program: String,
    device: Arc<dyn Device>,
    sink: Arc<dyn LogSink>,
    state: AtomicU8,
}

impl Control {
    pub(crate) fn new(program: &str, device: Arc<dyn Device>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            program: program.to_string(),
            device,
            sink,
            state: AtomicU8::new(STATE_CREATED),
        }
    }

    /// Start the engine workers.
    ///
    /// Must only be called once the device is fully wired; packets may
    /// start flowing immediately afterwards.
    pub fn start(&self) {
        if self
            .state
            .compare_exchange(
                STATE_CREATED,
                STATE_RUNNING,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            log::warn!("overlay engine start requested more than once; ignoring");
            return;
        }
        self.log(format!(
            "{}: interface {} up ({})",
            self.program,
            self.device.name(),
            self.device.cidr()
        ));
    }

    /// Stop the engine workers and tear the device down.
    ///
    /// Safe to call again after the first stop; later calls are no-ops.
    /// Device close failures are logged rather than propagated so that
    /// engine teardown never escalates.
    pub async fn stop(&self) {
        if self.state.swap(STATE_STOPPED, Ordering::AcqRel) == STATE_STOPPED {
            return;
        }
        self.log(format!("{}: shutting down", self.program));
        if let Err(e) = self.device.close().await {
            self.log(format!("{}: device close failed: {}", self.program, e));
        }
    }

    /// Check if the engine is between `start` and `stop`
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) == STATE_RUNNING
    }

    /// The device this engine instance drives
    pub fn device(&self) -> Arc<dyn Device> {
        self.device.clone()
    }

    fn log(&self, line: String) {
        self.sink.write_line(line.as_bytes());
    }
}

impl std::fmt::Debug for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Control")
            .field("program", &self.program)
            .field("device", &self.device.name())
            .field("running", &self.is_running())
            .finish()
    }
}
