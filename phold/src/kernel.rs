//! Host kernel boundary.
//!
//! A PHOLD node does not own its links, clocks or event transport. The host
//! simulation kernel provides them through [`Kernel`]; the node only decides
//! which port to use, how long to wait and how big the payload is.

use crate::payload::Payload;
use crate::time::SimTime;

/// Event exchanged between PHOLD nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PholdEvent {
    /// Bytes carried by the event.
    pub payload: Payload,
}

impl PholdEvent {
    /// Wrap a payload.
    pub fn new(payload: Payload) -> Self {
        Self { payload }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.payload.size()
    }
}

/// Services the host kernel offers to the node it is currently running.
///
/// The kernel delivers at most one event to a given node at a time, and events
/// sent on one link arrive in send order.
pub trait Kernel {
    /// Current simulated time.
    fn now(&self) -> SimTime;

    /// Send `event` out of `port`, delivered `delay` after the link latency.
    fn send(&mut self, port: usize, event: PholdEvent, delay: SimTime);

    /// Ask for a periodic clock callback every `period`.
    fn register_clock(&mut self, period: SimTime);

    /// Tell the kernel this node no longer holds the simulation open.
    fn primary_ok_to_end(&mut self);
}
