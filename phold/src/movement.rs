//! Neighbor selection.
//!
//! The policy is a tagged value rather than a function pointer so that a
//! checkpoint can rebuild it from its tag and counter alone.

use std::fmt;

use crate::rng::NodeRng;

/// Name of a movement policy as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementKind {
    /// Uniformly random link.
    Random,
    /// Links in round-robin order.
    Cyclic,
}

impl MovementKind {
    /// Parse a configured policy name. Unknown names fall back to `Random`.
    pub fn from_name(name: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| {
            tracing::warn!(name, "unrecognized movement function, falling back to random");
            MovementKind::Random
        })
    }

    /// Strict parse, `None` for unknown names.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "random" => Some(MovementKind::Random),
            "cyclic" => Some(MovementKind::Cyclic),
            _ => None,
        }
    }

    /// Canonical name, as written to checkpoints.
    pub fn name(self) -> &'static str {
        match self {
            MovementKind::Random => "random",
            MovementKind::Cyclic => "cyclic",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Movement policy with its mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovementPolicy {
    /// `u32 mod num_links`, one draw per call.
    Random,
    /// Returns `next`, then advances it modulo the link count.
    Cyclic {
        /// Index returned by the next call, in `[0, num_links)`.
        next: usize,
    },
}

impl MovementPolicy {
    /// Fresh policy for `kind`. A cyclic policy starts at index 0.
    pub fn new(kind: MovementKind) -> Self {
        match kind {
            MovementKind::Random => MovementPolicy::Random,
            MovementKind::Cyclic => MovementPolicy::Cyclic { next: 0 },
        }
    }

    /// Tag of this policy.
    pub fn kind(&self) -> MovementKind {
        match self {
            MovementPolicy::Random => MovementKind::Random,
            MovementPolicy::Cyclic { .. } => MovementKind::Cyclic,
        }
    }

    /// Cyclic counter, 0 for the random policy.
    pub fn counter(&self) -> usize {
        match self {
            MovementPolicy::Random => 0,
            MovementPolicy::Cyclic { next } => *next,
        }
    }

    /// Pick a slot index in `[0, num_links)`. The slot may be absent.
    ///
    /// `num_links` must be non-zero.
    pub fn select(&mut self, rng: &mut NodeRng, num_links: usize) -> usize {
        debug_assert!(num_links > 0);
        match self {
            MovementPolicy::Random => rng.next_uniform_u32() as usize % num_links,
            MovementPolicy::Cyclic { next } => {
                let current = *next % num_links;
                *next = (current + 1) % num_links;
                current
            }
        }
    }
}
