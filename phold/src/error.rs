//! Error types for node construction, checkpoints and the reference kernel.

use thiserror::Error;

/// Errors raised while building, restoring or driving a PHOLD node.
#[derive(Debug, Error)]
pub enum PholdError {
    /// The node has no link slot to forward events to.
    ///
    /// Dispatch retries until it hits a present slot, so a node without one
    /// would spin forever. This is rejected at construction.
    #[error("node has no usable link slots (num_links = {num_links})")]
    NoLinks {
        /// Number of slots that were configured.
        num_links: usize,
    },

    /// A grid coordinate is unset, negative or outside the grid.
    #[error("invalid grid position {name} = {value} (rows = {rows}, cols = {cols})")]
    InvalidPosition {
        /// Parameter name that carried the bad value.
        name: &'static str,
        /// The offending value.
        value: i64,
        /// Configured row count.
        rows: i64,
        /// Configured column count.
        cols: i64,
    },

    /// The supplied slot vector does not have `(2*rings+1)^2` entries.
    #[error("expected {expected} link slots, got {actual}")]
    LinkCountMismatch {
        /// Slot count derived from the ring count.
        expected: usize,
        /// Slot count provided by the topology.
        actual: usize,
    },

    /// The ring count implies more link slots than fit in `usize`.
    #[error("{rings} rings is too many link slots to address")]
    TooManyRings {
        /// Configured ring count.
        rings: u32,
    },

    /// A world checkpoint does not fit the grid it is restored into.
    #[error("invalid world snapshot: {0}")]
    InvalidSnapshot(String),

    /// A time string could not be parsed.
    #[error("invalid time value: {0:?}")]
    InvalidTime(String),

    /// A checkpoint could not be encoded or decoded.
    #[error("checkpoint codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// The checkpoint was written by an incompatible format version.
    #[error("unsupported checkpoint version {found} (expected {expected})")]
    UnsupportedCheckpointVersion {
        /// Version found in the record.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },
}

/// A type alias for `Result<T, PholdError>`.
pub type PholdResult<T> = Result<T, PholdError>;
