//! Node identity and link slots.

use serde::{Deserialize, Serialize};

use crate::config::num_links_for_rings;
use crate::error::{PholdError, PholdResult};

/// Immutable grid position of a node.
///
/// `global_id = row * col_count + col`. It seeds the node's random stream and
/// names the node in diagnostics; nothing else depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    row: u64,
    col: u64,
    row_count: u64,
    col_count: u64,
    global_id: u64,
}

impl NodeIdentity {
    /// Validate a position and derive the global id.
    ///
    /// Negative values (including the unset sentinel) and positions outside
    /// the grid are rejected rather than folded into a bogus id.
    pub fn new(row: i64, col: i64, row_count: i64, col_count: i64) -> PholdResult<Self> {
        let invalid = |name, value| PholdError::InvalidPosition {
            name,
            value,
            rows: row_count,
            cols: col_count,
        };

        if row_count <= 0 {
            return Err(invalid("rowCount", row_count));
        }
        if col_count <= 0 {
            return Err(invalid("colCount", col_count));
        }
        if !(0..row_count).contains(&row) {
            return Err(invalid("i", row));
        }
        if !(0..col_count).contains(&col) {
            return Err(invalid("j", col));
        }

        let (row, col) = (row as u64, col as u64);
        let (row_count, col_count) = (row_count as u64, col_count as u64);
        Ok(Self {
            row,
            col,
            row_count,
            col_count,
            global_id: row * col_count + col,
        })
    }

    /// Grid row.
    pub fn row(&self) -> u64 {
        self.row
    }

    /// Grid column.
    pub fn col(&self) -> u64 {
        self.col
    }

    /// Grid row count.
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Grid column count.
    pub fn col_count(&self) -> u64 {
        self.col_count
    }

    /// Row-major id of the node within the grid.
    pub fn global_id(&self) -> u64 {
        self.global_id
    }
}

/// Presence map of a node's `(2*rings+1)^2` link slots.
///
/// Slots are numbered like the node's ports. A slot is absent when no link was
/// wired to that port, for example past the grid boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSlots {
    present: Vec<bool>,
}

impl LinkSlots {
    /// Build from a presence vector. At least one slot must be present.
    pub fn new(present: Vec<bool>) -> PholdResult<Self> {
        if present.is_empty() || !present.iter().any(|p| *p) {
            return Err(PholdError::NoLinks {
                num_links: present.len(),
            });
        }
        Ok(Self { present })
    }

    /// Build for a node with `rings` rings, checking the slot count.
    pub fn for_rings(rings: u32, present: Vec<bool>) -> PholdResult<Self> {
        let expected = num_links_for_rings(rings)?;
        if present.len() != expected {
            return Err(PholdError::LinkCountMismatch {
                expected,
                actual: present.len(),
            });
        }
        Self::new(present)
    }

    /// All `(2*rings+1)^2` slots present.
    pub fn all_present(rings: u32) -> PholdResult<Self> {
        Ok(Self {
            present: vec![true; num_links_for_rings(rings)?],
        })
    }

    /// Total slot count, present or not.
    pub fn num_links(&self) -> usize {
        self.present.len()
    }

    /// Number of present slots.
    pub fn present_count(&self) -> usize {
        self.present.iter().filter(|p| **p).count()
    }

    /// Whether slot `index` has a link.
    pub fn is_present(&self, index: usize) -> bool {
        self.present.get(index).copied().unwrap_or(false)
    }
}
