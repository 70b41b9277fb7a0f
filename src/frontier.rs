//! Free-position finder: empty cells a new block may attach to.
//!
//! Frontiers are always rebuilt from the shape passed in. Nothing here
//! caches or patches a previous result.

use crate::geometry::euclidean_distance;
use crate::types::{cell_key, GridPoint, Orientation, Shape};
use serde::Serialize;
use std::collections::HashSet;

/// Every empty cell touching `shape`, in generation order.
///
/// Generation order is: shape order, then left, right, up, down for each
/// cell, keeping the first occurrence of a repeated cell.
pub fn frontier(shape: &Shape) -> Vec<GridPoint> {
    let occupied: HashSet<u64> = shape.cells().iter().map(|&c| cell_key(c)).collect();
    let mut seen: HashSet<u64> = HashSet::with_capacity(shape.len() * 4);
    let mut out = Vec::with_capacity(shape.len() * 2 + 2);

    for &c in shape.cells() {
        for n in c.neighbors() {
            let key = cell_key(n);
            if occupied.contains(&key) || !seen.insert(key) {
                continue;
            }
            out.push(n);
        }
    }
    out
}

/// The two cells that extend a target shape along its major axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TargetSlots {
    pub start: GridPoint,
    pub end: GridPoint,
}

impl TargetSlots {
    pub fn contains(&self, p: GridPoint) -> bool {
        self.start == p || self.end == p
    }

    pub fn to_array(self) -> [GridPoint; 2] {
        [self.start, self.end]
    }
}

/// Axis-extension slots of `target`, or `None` for an empty target.
///
/// The endpoints are the cells with the lowest and highest coordinate along
/// `orientation` (earliest in shape order on ties); each slot is one step
/// beyond its endpoint. Side neighbours are never slots.
pub fn target_slots(target: &Shape, orientation: Orientation) -> Option<TargetSlots> {
    let cells = target.cells();
    let mut first = *cells.first()?;
    let mut last = first;
    for &c in &cells[1..] {
        if orientation.axis_of(c) < orientation.axis_of(first) {
            first = c;
        }
        if orientation.axis_of(c) > orientation.axis_of(last) {
            last = c;
        }
    }
    let (dx, dy) = orientation.step();
    Some(TargetSlots {
        start: first.offset(-dx, -dy),
        end: last.offset(dx, dy),
    })
}

/// Closest candidate to `from` and its distance.
///
/// Ties go to the earliest candidate, so the result depends only on the
/// candidate order.
pub fn nearest(candidates: &[GridPoint], from: GridPoint) -> Option<(GridPoint, f64)> {
    let mut best: Option<(GridPoint, f64)> = None;
    for &c in candidates {
        let d = euclidean_distance(from, c);
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((c, d)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::manhattan_adjacent;
    use crate::rng::TaskRng;

    fn shape(cells: &[(i32, i32)]) -> Shape {
        Shape::from_cells(cells.iter().map(|&c| GridPoint::from(c)))
    }

    #[test]
    fn test_frontier_single_cell() {
        let f = frontier(&shape(&[(0, 0)]));
        assert_eq!(
            f,
            vec![
                GridPoint::new(-1, 0),
                GridPoint::new(1, 0),
                GridPoint::new(0, -1),
                GridPoint::new(0, 1),
            ]
        );
    }

    #[test]
    fn test_frontier_line_order_and_size() {
        let f = frontier(&shape(&[(0, 0), (1, 0), (2, 0)]));
        // 2 end caps + 3 above + 3 below
        assert_eq!(f.len(), 8);
        assert_eq!(f[0], GridPoint::new(-1, 0));
        assert_eq!(f[1], GridPoint::new(0, -1));
        assert!(f.contains(&GridPoint::new(3, 0)));
    }

    #[test]
    fn test_frontier_empty_shape() {
        assert!(frontier(&Shape::new()).is_empty());
    }

    #[test]
    fn test_frontier_properties_random() {
        let mut rng = TaskRng::from_seed(3);
        for _ in 0..50 {
            let s = Shape::from_cells(
                (0..12).map(|_| GridPoint::new(rng.gen_range(5) as i32, rng.gen_range(5) as i32)),
            );
            let f = frontier(&s);
            let unique: HashSet<_> = f.iter().collect();
            assert_eq!(unique.len(), f.len());
            for &c in &f {
                assert!(!s.contains(c));
                assert!(s.cells().iter().any(|&o| manhattan_adjacent(o, c)));
            }
            // every empty neighbour is present
            for &o in s.cells() {
                for n in o.neighbors() {
                    assert!(s.contains(n) || f.contains(&n));
                }
            }
        }
    }

    #[test]
    fn test_target_slots_row() {
        let t = shape(&[(4, 0), (5, 0), (6, 0)]);
        let slots = target_slots(&t, Orientation::Row).unwrap();
        assert_eq!(slots.start, GridPoint::new(3, 0));
        assert_eq!(slots.end, GridPoint::new(7, 0));
    }

    #[test]
    fn test_target_slots_column() {
        let t = shape(&[(2, 3), (2, 4), (2, 5)]);
        let slots = target_slots(&t, Orientation::Column).unwrap();
        assert_eq!(slots.to_array(), [GridPoint::new(2, 2), GridPoint::new(2, 6)]);
    }

    #[test]
    fn test_target_slots_single_cell_has_two() {
        let slots = target_slots(&shape(&[(1, 1)]), Orientation::Row).unwrap();
        assert_ne!(slots.start, slots.end);
        assert_eq!(slots.to_array(), [GridPoint::new(0, 1), GridPoint::new(2, 1)]);
    }

    #[test]
    fn test_target_slots_follow_extension_order() {
        // Block appended at the start slot lands last in shape order.
        let t = shape(&[(4, 0), (5, 0), (6, 0), (3, 0)]);
        let slots = target_slots(&t, Orientation::Row).unwrap();
        assert_eq!(slots.to_array(), [GridPoint::new(2, 0), GridPoint::new(7, 0)]);
    }

    #[test]
    fn test_target_slots_are_frontier_but_not_sides() {
        let t = shape(&[(4, 0), (5, 0), (6, 0)]);
        let f = frontier(&t);
        let slots = target_slots(&t, Orientation::Row).unwrap();
        assert!(f.contains(&slots.start) && f.contains(&slots.end));
        assert!(!slots.contains(GridPoint::new(5, 1)));
        assert!(!slots.contains(GridPoint::new(4, -1)));
    }

    #[test]
    fn test_nearest_breaks_ties_by_order() {
        let cands = [GridPoint::new(1, 0), GridPoint::new(-1, 0), GridPoint::new(0, 1)];
        let (p, d) = nearest(&cands, GridPoint::new(0, 0)).unwrap();
        assert_eq!(p, GridPoint::new(1, 0));
        assert_eq!(d, 1.0);
        assert!(nearest(&[], GridPoint::new(0, 0)).is_none());
    }
}
