//! Grid wiring for the reference kernel.
//!
//! Each node enumerates the offsets `(di, dj)` in `[-rings, rings]^2` in
//! row-major order. Offsets that land inside the grid (including the node
//! itself) get consecutive port numbers starting at 0; the remaining slots up
//! to `(2*rings+1)^2` stay unwired. Every wired port knows the peer node and
//! the peer's port for the reverse offset, so links are symmetric.

use crate::config::num_links_for_rings;
use crate::error::{PholdError, PholdResult};
use crate::identity::LinkSlots;

/// Far end of a wired port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortTarget {
    /// Index of the peer node (its global id).
    pub node: usize,
    /// Port on the peer the event arrives on.
    pub port: usize,
}

/// Wiring of a `rows x cols` grid with `rings` rings of neighbors.
#[derive(Debug, Clone)]
pub struct GridTopology {
    rows: usize,
    cols: usize,
    rings: u32,
    ports: Vec<Vec<Option<PortTarget>>>,
}

impl GridTopology {
    /// Wire the grid.
    pub fn new(rows: usize, cols: usize, rings: u32) -> PholdResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(PholdError::NoLinks { num_links: 0 });
        }

        let mut topology = Self {
            rows,
            cols,
            rings,
            ports: Vec::with_capacity(rows * cols),
        };

        let num_links = num_links_for_rings(rings)?;
        for row in 0..rows {
            for col in 0..cols {
                let mut ports = vec![None; num_links];
                let mut next_port = 0;
                for (di, dj) in topology.offsets() {
                    let Some((peer_row, peer_col)) = topology.neighbor(row, col, di, dj) else {
                        continue;
                    };
                    let peer_port = topology
                        .port_index(peer_row, peer_col, -di, -dj)
                        .ok_or(PholdError::NoLinks { num_links })?;
                    ports[next_port] = Some(PortTarget {
                        node: peer_row * cols + peer_col,
                        port: peer_port,
                    });
                    next_port += 1;
                }
                topology.ports.push(ports);
            }
        }

        Ok(topology)
    }

    /// Number of grid rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of grid columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Ports of `node`, indexed by slot.
    pub fn ports(&self, node: usize) -> &[Option<PortTarget>] {
        &self.ports[node]
    }

    /// Presence map handed to the node at construction.
    pub fn slots(&self, node: usize) -> PholdResult<LinkSlots> {
        let present = self.ports[node].iter().map(Option::is_some).collect();
        LinkSlots::for_rings(self.rings, present)
    }

    fn offsets(&self) -> impl Iterator<Item = (i64, i64)> {
        let r = i64::from(self.rings);
        (-r..=r).flat_map(move |di| (-r..=r).map(move |dj| (di, dj)))
    }

    fn neighbor(&self, row: usize, col: usize, di: i64, dj: i64) -> Option<(usize, usize)> {
        let peer_row = row as i64 + di;
        let peer_col = col as i64 + dj;
        let inside = (0..self.rows as i64).contains(&peer_row)
            && (0..self.cols as i64).contains(&peer_col);
        inside.then_some((peer_row as usize, peer_col as usize))
    }

    fn port_index(&self, row: usize, col: usize, di: i64, dj: i64) -> Option<usize> {
        self.offsets()
            .filter(|&(ddi, ddj)| self.neighbor(row, col, ddi, ddj).is_some())
            .position(|offset| offset == (di, dj))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_and_center_of_three_by_three() {
        let grid = GridTopology::new(3, 3, 1).unwrap();
        assert_eq!(grid.node_count(), 9);

        // Center sees all nine offsets.
        let center = grid.slots(4).unwrap();
        assert_eq!(center.num_links(), 9);
        assert_eq!(center.present_count(), 9);

        // Corner (0,0) sees itself, right, down and diagonal.
        let corner = grid.slots(0).unwrap();
        assert_eq!(corner.num_links(), 9);
        assert_eq!(corner.present_count(), 4);
        assert!((0..4).all(|slot| corner.is_present(slot)));
        assert!((4..9).all(|slot| !corner.is_present(slot)));
    }

    #[test]
    fn self_port_loops_back() {
        let grid = GridTopology::new(3, 3, 1).unwrap();
        // For the center, offset (0,0) is slot 4.
        assert_eq!(grid.ports(4)[4], Some(PortTarget { node: 4, port: 4 }));
        // For corner (0,0), offset (0,0) is its first port.
        assert_eq!(grid.ports(0)[0], Some(PortTarget { node: 0, port: 0 }));
    }

    #[test]
    fn links_are_symmetric() {
        for (rows, cols, rings) in [(3, 3, 1), (4, 6, 2), (1, 5, 1), (5, 5, 3)] {
            let grid = GridTopology::new(rows, cols, rings).unwrap();
            for node in 0..grid.node_count() {
                for (port, target) in grid.ports(node).iter().enumerate() {
                    if let Some(target) = target {
                        let back = grid.ports(target.node)[target.port];
                        assert_eq!(back, Some(PortTarget { node, port }));
                    }
                }
            }
        }
    }

    #[test]
    fn single_cell_grid_only_links_itself() {
        let grid = GridTopology::new(1, 1, 2).unwrap();
        let slots = grid.slots(0).unwrap();
        assert_eq!(slots.num_links(), 25);
        assert_eq!(slots.present_count(), 1);
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert!(GridTopology::new(0, 3, 1).is_err());
    }
}
