//! Connectivity analysis over a sparse set of grid cells.
//!
//! A block may be picked up only if the rest of its shape stays one
//! 4-connected piece without it. The adjacency structure mirrors a
//! neighbour cache: flat edge storage with per-cell offsets.

use crate::geometry::manhattan_adjacent;
use crate::types::{cell_key, GridPoint, Shape};
use std::collections::HashMap;

/// Adjacency graph over an indexed list of cells.
///
/// `neighbors(i)` lists the indices of the cells that share an edge with
/// cell `i`. Neighbour order follows `GridPoint::neighbors`.
pub struct Adjacency {
    /// Flat storage of all neighbour indices.
    data: Vec<usize>,
    /// offsets[i] = start index in `data` for cell i.
    offsets: Vec<usize>,
}

impl Adjacency {
    /// Build the graph using a cell-key hash for O(n) neighbour lookup.
    pub fn build(points: &[GridPoint]) -> Self {
        let index: HashMap<u64, usize> = points
            .iter()
            .enumerate()
            .map(|(i, &p)| (cell_key(p), i))
            .collect();

        let mut data = Vec::with_capacity(points.len() * 4);
        let mut offsets = Vec::with_capacity(points.len() + 1);
        for &p in points {
            offsets.push(data.len());
            for n in p.neighbors() {
                if let Some(&j) = index.get(&cell_key(n)) {
                    data.push(j);
                }
            }
        }
        offsets.push(data.len()); // sentinel

        Self { data, offsets }
    }

    /// Reference construction: test every unordered pair.
    pub fn build_pairwise(points: &[GridPoint]) -> Self {
        let mut lists: Vec<Vec<usize>> = vec![Vec::new(); points.len()];
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                if manhattan_adjacent(points[i], points[j]) {
                    lists[i].push(j);
                    lists[j].push(i);
                }
            }
        }
        let mut data = Vec::new();
        let mut offsets = Vec::with_capacity(points.len() + 1);
        for list in lists {
            offsets.push(data.len());
            data.extend(list);
        }
        offsets.push(data.len());
        Self { data, offsets }
    }

    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn neighbors(&self, i: usize) -> &[usize] {
        &self.data[self.offsets[i]..self.offsets[i + 1]]
    }

    /// Number of cells reachable from `root`, root included.
    pub fn reachable_from(&self, root: usize) -> usize {
        let n = self.len();
        if root >= n {
            return 0;
        }
        let mut visited = vec![false; n];
        let mut queue = vec![root];
        visited[root] = true;

        let mut head = 0;
        while head < queue.len() {
            let cur = queue[head];
            head += 1;
            for &next in self.neighbors(cur) {
                if !visited[next] {
                    visited[next] = true;
                    queue.push(next);
                }
            }
        }
        queue.len()
    }
}

/// Build the adjacency graph for `points`.
pub fn build_adjacency(points: &[GridPoint]) -> Adjacency {
    Adjacency::build(points)
}

/// True iff every point is reachable from `points[root]`.
///
/// The empty set is connected. An out-of-range root on a non-empty set
/// reaches nothing and is reported as disconnected.
pub fn is_connected(points: &[GridPoint], root: usize) -> bool {
    if points.is_empty() {
        return true;
    }
    Adjacency::build(points).reachable_from(root) == points.len()
}

/// True iff `candidate` can be lifted without splitting `shape`.
///
/// Removing a cell outside the shape is a no-op and always allowed.
pub fn can_remove(shape: &Shape, candidate: GridPoint) -> bool {
    if !shape.contains(candidate) {
        return true;
    }
    let remaining = shape.without(candidate);
    if remaining.len() <= 1 {
        return true;
    }
    is_connected(remaining.cells(), 0)
}

/// Every cell of `shape` that passes `can_remove`, in shape order.
pub fn movable_cells(shape: &Shape) -> Vec<GridPoint> {
    shape
        .cells()
        .iter()
        .copied()
        .filter(|&c| can_remove(shape, c))
        .collect()
}
