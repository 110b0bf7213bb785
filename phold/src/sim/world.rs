//! The reference kernel loop.
//!
//! [`GridWorld`] owns every node of a grid and delivers their events in
//! (time, sequence) order. A [`WorldSnapshot`] captures the nodes and the
//! pending queue so a run can be paused and resumed.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::checkpoint::NodeSnapshot;
use crate::config::NodeConfig;
use crate::error::{PholdError, PholdResult};
use crate::kernel::{Kernel, PholdEvent};
use crate::node::{NodeSummary, PholdNode};
use crate::payload::Payload;
use crate::time::SimTime;

use super::events::{Event, EventQueue, ScheduledEvent};
use super::topology::{GridTopology, PortTarget};

/// A delivery or clock tick waiting in the queue, as stored in a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingEvent {
    /// PHOLD event in flight.
    Deliver {
        /// Delivery time.
        time: SimTime,
        /// Scheduling sequence number.
        sequence: u64,
        /// Receiving node.
        node: usize,
        /// Receiving port.
        port: usize,
        /// Payload size in bytes.
        size: usize,
    },
    /// Clock tick.
    Clock {
        /// Tick time.
        time: SimTime,
        /// Scheduling sequence number.
        sequence: u64,
        /// Ticking node.
        node: usize,
        /// Clock period.
        period: SimTime,
    },
}

/// Checkpoint of a whole grid run: node payloads plus kernel state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Simulated time at the checkpoint.
    pub now: SimTime,
    /// Next scheduling sequence number.
    pub next_sequence: u64,
    /// Events processed so far.
    pub events_processed: u64,
    /// One snapshot per node, by global id.
    pub nodes: Vec<NodeSnapshot>,
    /// Queue contents in execution order.
    pub pending: Vec<PendingEvent>,
}

/// Sequential reference kernel driving a grid of PHOLD nodes.
///
/// Events are delivered `link_delay + delay` after they are sent. Ties are
/// broken by scheduling order, which keeps every link FIFO and makes a run
/// fully reproducible.
#[derive(Debug)]
pub struct GridWorld {
    topology: GridTopology,
    nodes: Vec<PholdNode>,
    queue: EventQueue,
    now: SimTime,
    next_sequence: u64,
    link_delay: SimTime,
    ok_to_end: Vec<bool>,
    events_processed: u64,
}

/// Kernel view handed to one node while it runs.
struct NodeContext<'a> {
    node: usize,
    now: SimTime,
    link_delay: SimTime,
    ports: &'a [Option<PortTarget>],
    queue: &'a mut EventQueue,
    next_sequence: &'a mut u64,
    ok_to_end: &'a mut bool,
}

impl NodeContext<'_> {
    fn schedule(&mut self, time: SimTime, event: Event) {
        let sequence = *self.next_sequence;
        *self.next_sequence += 1;
        self.queue.schedule(ScheduledEvent::new(time, event, sequence));
    }
}

impl Kernel for NodeContext<'_> {
    fn now(&self) -> SimTime {
        self.now
    }

    fn send(&mut self, port: usize, event: PholdEvent, delay: SimTime) {
        let Some(Some(target)) = self.ports.get(port).copied() else {
            tracing::error!(node = self.node, port, "send on unwired port, event dropped");
            return;
        };
        let time = self
            .now
            .saturating_add(self.link_delay)
            .saturating_add(delay);
        self.schedule(
            time,
            Event::Deliver {
                node: target.node,
                port: target.port,
                event,
            },
        );
    }

    fn register_clock(&mut self, period: SimTime) {
        let time = self.now.saturating_add(period);
        self.schedule(
            time,
            Event::Clock {
                node: self.node,
                period,
            },
        );
    }

    fn primary_ok_to_end(&mut self) {
        *self.ok_to_end = true;
    }
}

impl GridWorld {
    /// Build every node of the grid described by `template`.
    ///
    /// The template's row and column count define the grid; its own position
    /// is ignored and replaced per node.
    pub fn new(template: &NodeConfig, link_delay: SimTime) -> PholdResult<Self> {
        let topology = Self::topology_for(template)?;

        let mut nodes = Vec::with_capacity(topology.node_count());
        for row in 0..topology.rows() {
            for col in 0..topology.cols() {
                let config = NodeConfig {
                    row: row as i64,
                    col: col as i64,
                    ..template.clone()
                };
                let slots = topology.slots(row * topology.cols() + col)?;
                nodes.push(PholdNode::new(&config, slots)?);
            }
        }

        Ok(Self::assemble(topology, nodes, link_delay))
    }

    /// Rebuild a world from a checkpoint.
    ///
    /// `template` supplies the grid shape and ring count used to rewire links;
    /// all node state comes from the snapshot.
    pub fn restore(
        template: &NodeConfig,
        link_delay: SimTime,
        snapshot: &WorldSnapshot,
    ) -> PholdResult<Self> {
        let topology = Self::topology_for(template)?;
        if snapshot.nodes.len() != topology.node_count() {
            return Err(PholdError::LinkCountMismatch {
                expected: topology.node_count(),
                actual: snapshot.nodes.len(),
            });
        }

        for (index, node) in snapshot.nodes.iter().enumerate() {
            check_node_record(&topology, index, node)?;
        }
        for pending in &snapshot.pending {
            check_pending(&topology, pending)?;
        }

        let nodes = snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| PholdNode::restore(node, topology.slots(index)?))
            .collect::<PholdResult<Vec<_>>>()?;

        let mut world = Self::assemble(topology, nodes, link_delay);
        world.now = snapshot.now;
        world.next_sequence = snapshot.next_sequence;
        world.events_processed = snapshot.events_processed;
        for pending in &snapshot.pending {
            let scheduled = match *pending {
                PendingEvent::Deliver {
                    time,
                    sequence,
                    node,
                    port,
                    size,
                } => ScheduledEvent::new(
                    time,
                    Event::Deliver {
                        node,
                        port,
                        event: PholdEvent::new(Payload::zeroed(size)),
                    },
                    sequence,
                ),
                PendingEvent::Clock {
                    time,
                    sequence,
                    node,
                    period,
                } => ScheduledEvent::new(time, Event::Clock { node, period }, sequence),
            };
            world.queue.schedule(scheduled);
        }

        tracing::debug!(
            now = world.now,
            nodes = world.nodes.len(),
            pending = world.queue.len(),
            "restored grid world"
        );
        Ok(world)
    }

    fn topology_for(template: &NodeConfig) -> PholdResult<GridTopology> {
        let rows = usize::try_from(template.row_count).map_err(|_| invalid_dim(template, "rowCount"))?;
        let cols = usize::try_from(template.col_count).map_err(|_| invalid_dim(template, "colCount"))?;
        GridTopology::new(rows, cols, template.num_rings)
    }

    fn assemble(topology: GridTopology, nodes: Vec<PholdNode>, link_delay: SimTime) -> Self {
        let count = nodes.len();
        Self {
            topology,
            nodes,
            queue: EventQueue::new(),
            now: 0,
            next_sequence: 0,
            link_delay,
            ok_to_end: vec![false; count],
            events_processed: 0,
        }
    }

    /// Run every node's setup: initial load and clock registration.
    ///
    /// Returns the total number of initial events.
    pub fn setup(&mut self) -> u64 {
        let mut total = 0;
        for index in 0..self.nodes.len() {
            let mut ctx = NodeContext {
                node: index,
                now: self.now,
                link_delay: self.link_delay,
                ports: self.topology.ports(index),
                queue: &mut self.queue,
                next_sequence: &mut self.next_sequence,
                ok_to_end: &mut self.ok_to_end[index],
            };
            total += self.nodes[index].setup(&mut ctx);
        }
        tracing::info!(
            nodes = self.nodes.len(),
            initial_events = total,
            "grid setup complete"
        );
        total
    }

    /// Process the next event. Returns `false` when the queue is empty.
    pub fn step(&mut self) -> bool {
        let Some(scheduled) = self.queue.pop_earliest() else {
            return false;
        };
        self.now = scheduled.time();
        self.events_processed += 1;

        match scheduled.into_event() {
            Event::Deliver { node, event, .. } => {
                let mut ctx = NodeContext {
                    node,
                    now: self.now,
                    link_delay: self.link_delay,
                    ports: self.topology.ports(node),
                    queue: &mut self.queue,
                    next_sequence: &mut self.next_sequence,
                    ok_to_end: &mut self.ok_to_end[node],
                };
                self.nodes[node].handle_event(event, &mut ctx);
            }
            Event::Clock { node, period } => {
                let mut ctx = NodeContext {
                    node,
                    now: self.now,
                    link_delay: self.link_delay,
                    ports: self.topology.ports(node),
                    queue: &mut self.queue,
                    next_sequence: &mut self.next_sequence,
                    ok_to_end: &mut self.ok_to_end[node],
                };
                let unregister = self.nodes[node].handle_clock(&mut ctx);
                if !unregister {
                    ctx.register_clock(period);
                }
            }
        }
        true
    }

    /// Process every event scheduled at or before `end`, then stop at `end`.
    #[instrument(skip(self))]
    pub fn run_until(&mut self, end: SimTime) {
        while self
            .queue
            .peek_earliest()
            .is_some_and(|next| next.time() <= end)
        {
            self.step();
        }
        self.now = self.now.max(end);
    }

    /// Capture the nodes and the pending queue.
    pub fn checkpoint(&self) -> WorldSnapshot {
        let pending = self
            .queue
            .sorted()
            .into_iter()
            .map(|scheduled| match scheduled.event() {
                Event::Deliver { node, port, event } => PendingEvent::Deliver {
                    time: scheduled.time(),
                    sequence: scheduled.sequence(),
                    node: *node,
                    port: *port,
                    size: event.size(),
                },
                Event::Clock { node, period } => PendingEvent::Clock {
                    time: scheduled.time(),
                    sequence: scheduled.sequence(),
                    node: *node,
                    period: *period,
                },
            })
            .collect();

        WorldSnapshot {
            now: self.now,
            next_sequence: self.next_sequence,
            events_processed: self.events_processed,
            nodes: self.nodes.iter().map(PholdNode::checkpoint).collect(),
            pending,
        }
    }

    /// Tear down: collect summary lines from verbose nodes.
    pub fn finish(&self) -> Vec<NodeSummary> {
        self.nodes.iter().filter_map(PholdNode::finish).collect()
    }

    /// Counters of every node, by global id.
    pub fn summaries(&self) -> Vec<NodeSummary> {
        self.nodes.iter().map(PholdNode::summary).collect()
    }

    /// Nodes by global id.
    pub fn nodes(&self) -> &[PholdNode] {
        &self.nodes
    }

    /// Grid wiring.
    pub fn topology(&self) -> &GridTopology {
        &self.topology
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Events processed so far, deliveries and clock ticks.
    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Events waiting in the queue.
    pub fn pending_event_count(&self) -> usize {
        self.queue.len()
    }

    /// Whether every node has signalled it is ok to end.
    pub fn all_ok_to_end(&self) -> bool {
        self.ok_to_end.iter().all(|ok| *ok)
    }
}

/// A node record must sit at the grid position its index names.
fn check_node_record(
    topology: &GridTopology,
    index: usize,
    node: &NodeSnapshot,
) -> PholdResult<()> {
    let id = &node.identity;
    let cols = topology.cols() as u64;
    let expected = ((index as u64) / cols, (index as u64) % cols);
    if (id.row(), id.col()) != expected
        || id.row_count() != topology.rows() as u64
        || id.col_count() != cols
    {
        return Err(PholdError::InvalidSnapshot(format!(
            "node record {index} is ({}, {}) of a {}x{} grid, expected ({}, {}) of {}x{}",
            id.row(),
            id.col(),
            id.row_count(),
            id.col_count(),
            expected.0,
            expected.1,
            topology.rows(),
            topology.cols()
        )));
    }
    Ok(())
}

/// Pending events must target an existing node, and deliveries a wired port.
fn check_pending(topology: &GridTopology, pending: &PendingEvent) -> PholdResult<()> {
    let (node, port) = match *pending {
        PendingEvent::Deliver { node, port, .. } => (node, Some(port)),
        PendingEvent::Clock { node, .. } => (node, None),
    };
    if node >= topology.node_count() {
        return Err(PholdError::InvalidSnapshot(format!(
            "pending event targets node {node}, grid has {}",
            topology.node_count()
        )));
    }
    if let Some(port) = port {
        if !topology.ports(node).get(port).is_some_and(Option::is_some) {
            return Err(PholdError::InvalidSnapshot(format!(
                "pending delivery to node {node} on unwired port {port}"
            )));
        }
    }
    Ok(())
}

fn invalid_dim(template: &NodeConfig, name: &'static str) -> PholdError {
    let value = if name == "rowCount" {
        template.row_count
    } else {
        template.col_count
    };
    PholdError::InvalidPosition {
        name,
        value,
        rows: template.row_count,
        cols: template.col_count,
    }
}
