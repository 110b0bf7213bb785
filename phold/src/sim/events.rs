//! Scheduled events and the time-ordered queue the reference kernel drains.

use std::{cmp::Ordering, collections::BinaryHeap};

use crate::kernel::PholdEvent;
use crate::time::SimTime;

/// Events the reference kernel schedules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Deliver a PHOLD event to a node's port.
    Deliver {
        /// Index of the receiving node.
        node: usize,
        /// Port the event arrives on.
        port: usize,
        /// The event itself.
        event: PholdEvent,
    },
    /// Periodic clock callback for a node.
    Clock {
        /// Index of the ticking node.
        node: usize,
        /// Clock period, used to reschedule.
        period: SimTime,
    },
}

/// An event scheduled for execution at a specific simulation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    time: SimTime,
    event: Event,
    sequence: u64, // For deterministic ordering
}

impl ScheduledEvent {
    /// Creates a new scheduled event.
    pub fn new(time: SimTime, event: Event, sequence: u64) -> Self {
        Self {
            time,
            event,
            sequence,
        }
    }

    /// Returns the scheduled execution time.
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Returns the scheduling sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns a reference to the event.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Consumes the scheduled event and returns the event.
    pub fn into_event(self) -> Event {
        self.event
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max heap, reverse to pop the earliest time first.
        // Same-time events pop in scheduling order, which keeps each link FIFO.
        match other.time.cmp(&self.time) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            other => other,
        }
    }
}

/// A priority queue for scheduling events in chronological order.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<ScheduledEvent>,
}

impl EventQueue {
    /// Creates a new empty event queue.
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
        }
    }

    /// Schedules an event for execution.
    pub fn schedule(&mut self, event: ScheduledEvent) {
        self.heap.push(event);
    }

    /// Removes and returns the earliest scheduled event.
    pub fn pop_earliest(&mut self) -> Option<ScheduledEvent> {
        self.heap.pop()
    }

    /// Returns a reference to the earliest scheduled event without removing it.
    pub fn peek_earliest(&self) -> Option<&ScheduledEvent> {
        self.heap.peek()
    }

    /// Pending events in execution order.
    pub fn sorted(&self) -> Vec<&ScheduledEvent> {
        let mut events: Vec<&ScheduledEvent> = self.heap.iter().collect();
        events.sort_by(|a, b| b.cmp(a));
        events
    }

    /// Returns `true` if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the number of events in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
