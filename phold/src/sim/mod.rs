//! Sequential reference kernel.
//!
//! The production host is a parallel kernel that owns links, clocks and
//! checkpoint persistence. This module is a small single-threaded stand-in
//! used to drive grids in tests and in the `phold-grid` binary.
//!
//! ## Submodules
//!
//! - `events` - Scheduled events and the time-ordered queue
//! - `topology` - Grid wiring and port numbering
//! - `world` - The kernel loop and whole-run checkpoints

pub mod events;
pub mod topology;
pub mod world;

pub use events::{Event, EventQueue, ScheduledEvent};
pub use topology::{GridTopology, PortTarget};
pub use world::{GridWorld, PendingEvent, WorldSnapshot};
