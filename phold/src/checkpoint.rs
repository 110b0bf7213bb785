//! Checkpoint payload of a PHOLD node.
//!
//! The snapshot holds everything needed to resume a node with identical
//! future behavior: identity, random stream position, movement tag and
//! counter, delay parameters, receive counter and configuration scalars.
//! Links are not part of it; the kernel rewires them on restore.
//!
//! Policy tags are stored as strings. A tag this build does not know is
//! restored with a warning as the default policy (`random` movement,
//! `constant` delay) instead of failing the restore.

use serde::{Deserialize, Serialize};

use crate::delay::DelayModel;
use crate::error::{PholdError, PholdResult};
use crate::identity::{LinkSlots, NodeIdentity};
use crate::movement::{MovementKind, MovementPolicy};
use crate::node::PholdNode;
use crate::payload::PayloadConfig;
use crate::rng::{NodeRng, RngState};
use crate::time::SimTime;

/// Format version written into every snapshot.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Movement policy as recorded in a checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementRecord {
    /// Policy name.
    pub tag: String,
    /// Cyclic counter, 0 for other policies.
    pub counter: u64,
}

/// Delay model as recorded in a checkpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayRecord {
    /// Model name.
    pub tag: String,
    /// Exponential multiplier.
    pub multiplier: f64,
    /// Uniform lower bound.
    pub min: f64,
    /// Uniform upper bound.
    pub max: f64,
}

/// Serialized state of one node, in fixed field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Format version, see [`CHECKPOINT_VERSION`].
    pub version: u32,
    /// Grid identity.
    pub identity: NodeIdentity,
    /// Rings of neighbors the node was wired with.
    pub num_rings: u32,
    /// Random stream position.
    pub rng: RngState,
    /// Movement policy and counter.
    pub movement: MovementRecord,
    /// Delay model parameters.
    pub delay: DelayRecord,
    /// Events received so far.
    pub recv_count: u64,
    /// Initial event density.
    pub event_density: f64,
    /// Payload size distribution.
    pub payload: PayloadConfig,
    /// Bytes of auxiliary component memory.
    pub component_size: usize,
    /// Configured run duration.
    pub time_to_run: SimTime,
    /// Teardown reporting flag.
    pub verbose: bool,
}

impl MovementRecord {
    fn capture(policy: &MovementPolicy) -> Self {
        Self {
            tag: policy.kind().name().to_string(),
            counter: policy.counter() as u64,
        }
    }

    fn rebuild(&self, num_links: usize) -> MovementPolicy {
        match MovementKind::parse(&self.tag) {
            Some(MovementKind::Random) => MovementPolicy::Random,
            Some(MovementKind::Cyclic) => MovementPolicy::Cyclic {
                next: (self.counter % num_links as u64) as usize,
            },
            None => {
                tracing::warn!(
                    tag = %self.tag,
                    "unrecognized movement tag in checkpoint, restoring as random"
                );
                MovementPolicy::Random
            }
        }
    }
}

impl DelayRecord {
    fn capture(model: &DelayModel) -> Self {
        let (multiplier, min, max) = match *model {
            DelayModel::Constant => (0.0, 0.0, 0.0),
            DelayModel::Exponential { multiplier } => (multiplier, 0.0, 0.0),
            DelayModel::Uniform { min, max } => (0.0, min, max),
        };
        Self {
            tag: model.name().to_string(),
            multiplier,
            min,
            max,
        }
    }

    fn rebuild(&self) -> DelayModel {
        match self.tag.as_str() {
            "constant" => DelayModel::Constant,
            "exponential" => DelayModel::Exponential {
                multiplier: self.multiplier,
            },
            "uniform" => DelayModel::Uniform {
                min: self.min,
                max: self.max,
            },
            _ => {
                tracing::warn!(
                    tag = %self.tag,
                    "unrecognized delay tag in checkpoint, restoring as constant"
                );
                DelayModel::Constant
            }
        }
    }
}

impl PholdNode {
    /// Capture the node's state.
    pub fn checkpoint(&self) -> NodeSnapshot {
        NodeSnapshot {
            version: CHECKPOINT_VERSION,
            identity: self.identity,
            num_rings: self.num_rings,
            rng: self.rng.state(),
            movement: MovementRecord::capture(&self.movement),
            delay: DelayRecord::capture(&self.delay),
            recv_count: self.recv_count,
            event_density: self.event_density,
            payload: self.payload,
            component_size: self.component.len(),
            time_to_run: self.time_to_run,
            verbose: self.verbose,
        }
    }

    /// Rebuild a node from a snapshot and the slots the kernel rewired.
    pub fn restore(snapshot: &NodeSnapshot, slots: LinkSlots) -> PholdResult<Self> {
        if snapshot.version != CHECKPOINT_VERSION {
            return Err(PholdError::UnsupportedCheckpointVersion {
                found: snapshot.version,
                expected: CHECKPOINT_VERSION,
            });
        }

        let identity = &snapshot.identity;
        // Re-validate: the record may come from outside this process.
        let identity = NodeIdentity::new(
            identity.row() as i64,
            identity.col() as i64,
            identity.row_count() as i64,
            identity.col_count() as i64,
        )?;

        let slots_expected = crate::config::num_links_for_rings(snapshot.num_rings)?;
        if slots.num_links() != slots_expected {
            return Err(PholdError::LinkCountMismatch {
                expected: slots_expected,
                actual: slots.num_links(),
            });
        }

        tracing::debug!(
            global_id = identity.global_id(),
            recv_count = snapshot.recv_count,
            word_pos = %snapshot.rng.word_pos,
            "restoring phold node"
        );

        Ok(Self {
            movement: snapshot.movement.rebuild(slots.num_links()),
            delay: snapshot.delay.rebuild(),
            rng: NodeRng::restore(snapshot.rng),
            identity,
            slots,
            num_rings: snapshot.num_rings,
            payload: snapshot.payload,
            event_density: snapshot.event_density,
            component: vec![0; snapshot.component_size],
            time_to_run: snapshot.time_to_run,
            verbose: snapshot.verbose,
            recv_count: snapshot.recv_count,
        })
    }
}

/// Byte encoding of node snapshots for the external persistence layer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckpointCodec;

impl CheckpointCodec {
    /// Encode a snapshot.
    pub fn encode(&self, snapshot: &NodeSnapshot) -> PholdResult<Vec<u8>> {
        Ok(serde_json::to_vec(snapshot)?)
    }

    /// Decode a snapshot, rejecting unknown format versions.
    pub fn decode(&self, bytes: &[u8]) -> PholdResult<NodeSnapshot> {
        let snapshot: NodeSnapshot = serde_json::from_slice(bytes)?;
        if snapshot.version != CHECKPOINT_VERSION {
            return Err(PholdError::UnsupportedCheckpointVersion {
                found: snapshot.version,
                expected: CHECKPOINT_VERSION,
            });
        }
        Ok(snapshot)
    }
}
