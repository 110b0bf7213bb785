//! The PHOLD node state machine.
//!
//! A node has a single state: it waits for an event, counts it, and forwards
//! a fresh event to a neighbor. It never terminates on its own; the kernel
//! stops delivering events when the run ends.
//!
//! Random draws happen in a fixed order, which is what makes a run
//! reproducible and a checkpoint resumable:
//!
//! - initial load, per event: neighbor selection, payload size
//! - dispatch, per received event: neighbor selection, delay, payload size

use std::fmt;

use crate::config::NodeConfig;
use crate::delay::DelayModel;
use crate::error::{PholdError, PholdResult};
use crate::identity::{LinkSlots, NodeIdentity};
use crate::kernel::{Kernel, PholdEvent};
use crate::load::initial_event_count;
use crate::movement::MovementPolicy;
use crate::payload::PayloadConfig;
use crate::rng::{NodeRng, RngState};
use crate::time::{PS_PER_NS, SimTime, delay_to_sim_time};

/// Period of the liveness clock every node registers at setup.
pub const LIVENESS_PERIOD: SimTime = 1000 * PS_PER_NS;

/// One cell of the PHOLD grid.
#[derive(Debug)]
pub struct PholdNode {
    pub(crate) identity: NodeIdentity,
    pub(crate) slots: LinkSlots,
    pub(crate) num_rings: u32,
    pub(crate) rng: NodeRng,
    pub(crate) movement: MovementPolicy,
    pub(crate) delay: DelayModel,
    pub(crate) payload: PayloadConfig,
    pub(crate) event_density: f64,
    pub(crate) component: Vec<u8>,
    pub(crate) time_to_run: SimTime,
    pub(crate) verbose: bool,
    pub(crate) recv_count: u64,
}

impl PholdNode {
    /// Build a node from its configuration and the slots the topology wired.
    ///
    /// Fails if the position is invalid, if `slots` does not have
    /// `(2*rings+1)^2` entries, or (via [`LinkSlots`]) if no slot is present.
    pub fn new(config: &NodeConfig, slots: LinkSlots) -> PholdResult<Self> {
        let identity = NodeIdentity::new(config.row, config.col, config.row_count, config.col_count)?;

        let expected = config.num_links()?;
        if slots.num_links() != expected {
            return Err(PholdError::LinkCountMismatch {
                expected,
                actual: slots.num_links(),
            });
        }

        if config.event_density < 0.0 {
            tracing::warn!(
                row = identity.row(),
                col = identity.col(),
                event_density = config.event_density,
                "negative event density, node will seed no initial events"
            );
        }

        tracing::debug!(
            row = identity.row(),
            col = identity.col(),
            global_id = identity.global_id(),
            num_links = expected,
            present = slots.present_count(),
            movement = %config.movement,
            delay = %config.delay,
            "constructed phold node"
        );

        Ok(Self {
            rng: NodeRng::seeded(identity.global_id()),
            identity,
            slots,
            num_rings: config.num_rings,
            movement: MovementPolicy::new(config.movement),
            delay: config.delay,
            payload: config.payload,
            event_density: config.event_density,
            component: vec![0; config.component_size],
            time_to_run: config.time_to_run,
            verbose: config.verbose,
            recv_count: 0,
        })
    }

    /// Seed the initial load and register the liveness clock.
    ///
    /// Initial events go out with zero delay. Returns how many were sent.
    pub fn setup(&mut self, kernel: &mut dyn Kernel) -> u64 {
        let count = initial_event_count(self.event_density, self.identity.global_id());
        for _ in 0..count {
            let port = self.select_port();
            let payload = self.payload.make_payload(&mut self.rng);
            kernel.send(port, PholdEvent::new(payload), 0);
        }
        kernel.register_clock(LIVENESS_PERIOD);

        tracing::debug!(
            global_id = self.identity.global_id(),
            initial_events = count,
            "node setup complete"
        );
        count
    }

    /// Consume a delivered event and forward a new one.
    pub fn handle_event(&mut self, event: PholdEvent, kernel: &mut dyn Kernel) {
        self.recv_count += 1;
        drop(event);

        let port = self.select_port();
        let delay = delay_to_sim_time(self.delay.sample(&mut self.rng));
        let payload = self.payload.make_payload(&mut self.rng);

        tracing::trace!(
            global_id = self.identity.global_id(),
            now = kernel.now(),
            port,
            delay,
            size = payload.size(),
            "forwarding event"
        );
        kernel.send(port, PholdEvent::new(payload), delay);
    }

    /// Liveness tick. Returns `true` to unregister the clock.
    pub fn handle_clock(&mut self, kernel: &mut dyn Kernel) -> bool {
        kernel.primary_ok_to_end();
        false
    }

    /// Teardown. Returns the summary line when the node is verbose.
    pub fn finish(&self) -> Option<NodeSummary> {
        let summary = self.summary();
        tracing::info!(
            row = summary.row,
            col = summary.col,
            recv_count = summary.recv_count,
            "node finished"
        );
        self.verbose.then_some(summary)
    }

    /// Current counters of this node.
    pub fn summary(&self) -> NodeSummary {
        NodeSummary {
            row: self.identity.row(),
            col: self.identity.col(),
            recv_count: self.recv_count,
            num_links: self.slots.num_links(),
        }
    }

    /// Draw slot indices until one is present.
    ///
    /// Terminates because [`LinkSlots`] always has a present slot.
    fn select_port(&mut self) -> usize {
        let num_links = self.slots.num_links();
        loop {
            let index = self.movement.select(&mut self.rng, num_links);
            if self.slots.is_present(index) {
                return index;
            }
        }
    }

    /// Grid identity.
    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// Link slot presence map.
    pub fn slots(&self) -> &LinkSlots {
        &self.slots
    }

    /// Events received so far.
    pub fn recv_count(&self) -> u64 {
        self.recv_count
    }

    /// Neighbor selection policy and its counter.
    pub fn movement(&self) -> &MovementPolicy {
        &self.movement
    }

    /// Delay model.
    pub fn delay_model(&self) -> DelayModel {
        self.delay
    }

    /// Position of the node's random stream.
    pub fn rng_state(&self) -> RngState {
        self.rng.state()
    }

    /// Bytes of auxiliary memory held by the node.
    pub fn component_size(&self) -> usize {
        self.component.len()
    }

    /// Configured run duration.
    pub fn time_to_run(&self) -> SimTime {
        self.time_to_run
    }

    /// Whether the node reports at teardown.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Per-node result line used for correctness checks across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSummary {
    /// Grid row.
    pub row: u64,
    /// Grid column.
    pub col: u64,
    /// Events received.
    pub recv_count: u64,
    /// Link slots of the node.
    pub num_links: usize,
}

impl NodeSummary {
    /// The summary line, with the link count appended when asked.
    pub fn line(&self, include_links: bool) -> String {
        if include_links {
            format!("{self}:{}", self.num_links)
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for NodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}:{}", self.row, self.col, self.recv_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::MovementKind;

    #[derive(Default)]
    struct Recorder {
        now: SimTime,
        sends: Vec<(usize, SimTime, usize)>,
        clocks: Vec<SimTime>,
        ok_to_end: usize,
    }

    impl Kernel for Recorder {
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

    fn config(density: f64) -> NodeConfig {
        NodeConfig {
            event_density: density,
            ..NodeConfig::at(1, 1, 3, 3)
        }
    }

    fn event() -> PholdEvent {
        PholdEvent::new(crate::payload::Payload::zeroed(8))
    }

    #[test]
    fn setup_sends_density_events_at_zero_delay() {
        let mut node = PholdNode::new(&config(2.0), LinkSlots::all_present(1).unwrap()).unwrap();
        let mut kernel = Recorder::default();

        assert_eq!(node.setup(&mut kernel), 2);
        assert_eq!(kernel.sends.len(), 2);
        assert!(kernel.sends.iter().all(|(port, delay, size)| {
            *port < 9 && *delay == 0 && *size == 8
        }));
        assert_eq!(kernel.clocks, vec![LIVENESS_PERIOD]);
        assert_eq!(node.recv_count(), 0);
    }

    #[test]
    fn dispatch_counts_and_forwards_once() {
        let mut node = PholdNode::new(&config(0.0), LinkSlots::all_present(1).unwrap()).unwrap();
        let mut kernel = Recorder::default();

        for _ in 0..10 {
            node.handle_event(event(), &mut kernel);
        }
        assert_eq!(node.recv_count(), 10);
        assert_eq!(kernel.sends.len(), 10);
    }

    #[test]
    fn dispatch_skips_absent_slots() {
        let mut present = vec![false; 9];
        present[7] = true;
        let slots = LinkSlots::new(present).unwrap();
        let mut node = PholdNode::new(&config(3.0), slots).unwrap();
        let mut kernel = Recorder::default();

        node.setup(&mut kernel);
        for _ in 0..20 {
            node.handle_event(event(), &mut kernel);
        }
        assert!(kernel.sends.iter().all(|(port, _, _)| *port == 7));
    }

    #[test]
    fn cyclic_dispatch_walks_present_slots() {
        let cfg = NodeConfig {
            movement: MovementKind::Cyclic,
            ..config(0.0)
        };
        let mut present = vec![true; 9];
        present[2] = false;
        present[5] = false;
        let mut node = PholdNode::new(&cfg, LinkSlots::new(present).unwrap()).unwrap();
        let mut kernel = Recorder::default();

        for _ in 0..8 {
            node.handle_event(event(), &mut kernel);
        }
        let ports: Vec<usize> = kernel.sends.iter().map(|(port, _, _)| *port).collect();
        assert_eq!(ports, vec![0, 1, 3, 4, 6, 7, 8, 0]);
    }

    #[test]
    fn exponential_dispatch_delays_are_positive() {
        let cfg = NodeConfig {
            delay: DelayModel::Exponential { multiplier: 1.0 },
            ..config(0.0)
        };
        let mut node = PholdNode::new(&cfg, LinkSlots::all_present(1).unwrap()).unwrap();
        let mut kernel = Recorder::default();
        for _ in 0..100 {
            node.handle_event(event(), &mut kernel);
        }
        assert!(kernel.sends.iter().any(|(_, delay, _)| *delay > 0));
    }

    #[test]
    fn construction_rejects_bad_topology() {
        let slots = LinkSlots::all_present(2).unwrap();
        assert!(matches!(
            PholdNode::new(&config(1.0), slots),
            Err(PholdError::LinkCountMismatch {
                expected: 9,
                actual: 25
            })
        ));

        let unset = NodeConfig::default();
        assert!(matches!(
            PholdNode::new(&unset, LinkSlots::all_present(1).unwrap()),
            Err(PholdError::InvalidPosition { .. })
        ));
    }

    #[test]
    fn negative_density_seeds_nothing() {
        let mut node = PholdNode::new(&config(-4.0), LinkSlots::all_present(1).unwrap()).unwrap();
        let mut kernel = Recorder::default();
        assert_eq!(node.setup(&mut kernel), 0);
        assert!(kernel.sends.is_empty());
    }

    #[test]
    fn clock_signals_ok_to_end_and_stays_registered() {
        let mut node = PholdNode::new(&config(0.0), LinkSlots::all_present(1).unwrap()).unwrap();
        let mut kernel = Recorder::default();
        assert!(!node.handle_clock(&mut kernel));
        assert_eq!(kernel.ok_to_end, 1);
    }

    #[test]
    fn component_memory_is_owned() {
        let cfg = NodeConfig {
            component_size: 4096,
            ..config(0.0)
        };
        let node = PholdNode::new(&cfg, LinkSlots::all_present(1).unwrap()).unwrap();
        assert_eq!(node.component_size(), 4096);
    }

    #[test]
    fn finish_reports_only_when_verbose() {
        let mut node = PholdNode::new(&config(0.0), LinkSlots::all_present(1).unwrap()).unwrap();
        let mut kernel = Recorder::default();
        node.handle_event(event(), &mut kernel);
        node.handle_event(event(), &mut kernel);
        assert_eq!(node.finish(), None);

        let verbose = NodeConfig {
            verbose: true,
            ..config(0.0)
        };
        let mut node = PholdNode::new(&verbose, LinkSlots::all_present(1).unwrap()).unwrap();
        node.handle_event(event(), &mut kernel);
        let summary = node.finish().unwrap();
        assert_eq!(summary.to_string(), "1,1:1");
        assert_eq!(summary.line(true), "1,1:1:9");
    }
}
