//! # PHOLD Workload Node
//!
//! Synthetic workload for stress-testing parallel discrete-event simulation
//! (PDES) kernels. Every cell of a 2D grid runs a [`PholdNode`]: it seeds an
//! initial burst of events and then forwards every event it receives to a
//! neighbor, forever, after a randomly drawn delay.
//!
//! ## Determinism
//!
//! Each node draws from its own ChaCha8 stream seeded with its row-major grid
//! id, never from shared state. The same grid therefore produces the same
//! per-node receive counts however the kernel partitions it across threads
//! or ranks, and a node restored from a [`NodeSnapshot`] continues with
//! bit-identical draws.
//!
//! ## Components
//!
//! | Piece | Type | Choices |
//! |-------|------|---------|
//! | Random stream | [`NodeRng`] | seeded from global id |
//! | Payload sizes | [`PayloadConfig`] | small / large by fraction |
//! | Neighbor selection | [`MovementPolicy`] | `random`, `cyclic` |
//! | Delay | [`DelayModel`] | `constant`, `exponential`, `uniform` |
//! | Initial load | [`initial_event_count`] | fractional density by grid position |
//! | Checkpoint | [`NodeSnapshot`], [`CheckpointCodec`] | versioned JSON |
//!
//! ## Quick Start
//!
//! ```rust
//! use phold::{GridWorld, NodeConfig};
//!
//! let template = NodeConfig {
//!     event_density: 2.0,
//!     ..NodeConfig::at(0, 0, 3, 3)
//! };
//! let mut world = GridWorld::new(&template, 1_000).unwrap();
//! assert_eq!(world.setup(), 18);
//! world.run_until(100_000);
//! assert!(world.summaries().iter().any(|s| s.recv_count > 0));
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

/// Checkpoint payload and codec.
pub mod checkpoint;
/// Parameter parsing and node configuration.
pub mod config;
/// Delay models.
pub mod delay;
/// Error types.
pub mod error;
/// Grid identity and link slots.
pub mod identity;
/// Host kernel interface.
pub mod kernel;
/// Initial load seeding.
pub mod load;
/// Neighbor selection policies.
pub mod movement;
/// The node state machine.
pub mod node;
/// Event payloads.
pub mod payload;
/// Per-node random streams.
pub mod rng;
/// Sequential reference kernel.
pub mod sim;
/// Simulated time.
pub mod time;

pub use checkpoint::{CHECKPOINT_VERSION, CheckpointCodec, DelayRecord, MovementRecord, NodeSnapshot};
pub use config::{NodeConfig, Params, UNSET_POSITION, num_links_for_rings};
pub use delay::{DELAY_SCALE, DelayModel};
pub use error::{PholdError, PholdResult};
pub use identity::{LinkSlots, NodeIdentity};
pub use kernel::{Kernel, PholdEvent};
pub use load::initial_event_count;
pub use movement::{MovementKind, MovementPolicy};
pub use node::{LIVENESS_PERIOD, NodeSummary, PholdNode};
pub use payload::{Payload, PayloadConfig};
pub use rng::{NodeRng, RngState};
pub use sim::{GridTopology, GridWorld, WorldSnapshot};
pub use time::{SimTime, parse_time};
