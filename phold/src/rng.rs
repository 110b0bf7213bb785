//! Per-node deterministic random number generation.
//!
//! Every node owns a ChaCha8 stream seeded only from its global grid id, so
//! the sequence a node draws never depends on which thread or rank hosts it.
//! The stream position is exposed as `(seed, word_pos)` so a checkpoint can
//! put the generator back exactly where it was.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Serializable position of a [`NodeRng`] stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    /// Seed the stream was created from (the node's global id).
    pub seed: u64,
    /// Offset into the stream, in 32-bit words.
    pub word_pos: u128,
}

/// Deterministic random stream owned by one node.
#[derive(Debug, Clone)]
pub struct NodeRng {
    seed: u64,
    rng: ChaCha8Rng,
    draws: u64,
}

impl NodeRng {
    /// Create the stream for the node with the given global id.
    pub fn seeded(global_id: u64) -> Self {
        Self {
            seed: global_id,
            rng: ChaCha8Rng::seed_from_u64(global_id),
            draws: 0,
        }
    }

    /// Rebuild a stream at a previously captured position.
    pub fn restore(state: RngState) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(state.seed);
        rng.set_word_pos(state.word_pos);
        Self {
            seed: state.seed,
            rng,
            draws: 0,
        }
    }

    /// Capture the current stream position.
    pub fn state(&self) -> RngState {
        RngState {
            seed: self.seed,
            word_pos: self.rng.get_word_pos(),
        }
    }

    /// Uniform real in `[0, 1)`.
    pub fn next_uniform_real(&mut self) -> f64 {
        self.draws += 1;
        self.rng.random::<f64>()
    }

    /// Uniform unsigned 32-bit value.
    pub fn next_uniform_u32(&mut self) -> u32 {
        self.draws += 1;
        self.rng.random::<u32>()
    }

    /// Seed the stream was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Draws taken through this handle since it was created or restored.
    pub fn draw_count(&self) -> u64 {
        self.draws
    }
}
