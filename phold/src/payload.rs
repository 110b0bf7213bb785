//! Event payloads.

use serde::{Deserialize, Serialize};

use crate::rng::NodeRng;

/// Size distribution for event payloads: small most of the time, large with
/// probability `large_fraction`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PayloadConfig {
    /// Bytes in a small payload.
    pub small_size: usize,
    /// Bytes in a large payload.
    pub large_size: usize,
    /// Probability in `[0, 1]` of drawing a large payload.
    pub large_fraction: f64,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            small_size: 8,
            large_size: 1024,
            large_fraction: 0.0,
        }
    }
}

impl PayloadConfig {
    /// Draw a payload. Always consumes exactly one real from `rng`.
    pub fn make_payload(&self, rng: &mut NodeRng) -> Payload {
        let r = rng.next_uniform_real();
        let size = if r < self.large_fraction {
            self.large_size
        } else {
            self.small_size
        };
        Payload::zeroed(size)
    }
}

/// Opaque bytes carried by an event. Only the size matters to the workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    data: Vec<u8>,
}

impl Payload {
    /// A zero-filled payload of `size` bytes.
    pub fn zeroed(size: usize) -> Self {
        Self {
            data: vec![0; size],
        }
    }

    /// Payload size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Raw payload bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
