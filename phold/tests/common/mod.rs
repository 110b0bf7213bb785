//! Shared helpers for integration tests.

#![allow(dead_code)]

use phold::{Kernel, Payload, PholdEvent, SimTime};

/// One send observed by [`RecordingKernel`]: `(port, delay, payload size)`.
pub type Send = (usize, SimTime, usize);

/// Kernel double that records everything a node asks of it.
#[derive(Debug, Default)]
pub struct RecordingKernel {
    pub now: SimTime,
    pub sends: Vec<Send>,
    pub clocks: Vec<SimTime>,
    pub ok_to_end: usize,
}

impl Kernel for RecordingKernel {
    fn now(&self) -> SimTime {
        self.now
    }

    fn send(&mut self, port: usize, event: PholdEvent, delay: SimTime) {
        self.sends.push((port, delay, event.size()));
    }

    fn register_clock(&mut self, period: SimTime) {
        self.clocks.push(period);
    }

    fn primary_ok_to_end(&mut self) {
        self.ok_to_end += 1;
    }
}

/// An incoming event of the given size.
pub fn incoming(size: usize) -> PholdEvent {
    PholdEvent::new(Payload::zeroed(size))
}

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_test_writer()
        .try_init();
}
