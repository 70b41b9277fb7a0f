//! Drop resolution: where a released block lands and how the drop is scored.
//!
//! Rule: the block goes to the target frontier only when the target
//! frontier is strictly closer than the source frontier AND no more than
//! `BOUNDARY_LIMIT` cells away. Everything else falls back to the source
//! frontier, including drops that are far from both shapes.

use crate::frontier::{frontier, nearest, TargetSlots};
use crate::geometry::to_grid;
use crate::types::{GridPoint, PixelPos, Shape};
use serde::Serialize;

/// Maximum distance, in cells, from the target frontier for a target attach.
pub const BOUNDARY_LIMIT: f64 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Zone {
    Source,
    Target,
}

/// How a drop is scored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PlacementOutcome {
    /// Target attach on one of the two extension slots.
    CorrectPlacement,
    /// Target attach anywhere else.
    WrongPosition,
    /// Released back onto the source.
    EarlyRelease,
}

/// Result of resolving one drop.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    /// The release position snapped to its nearest cell.
    pub dropped: GridPoint,
    pub zone: Zone,
    /// Cell the block now occupies.
    pub cell: GridPoint,
    pub outcome: PlacementOutcome,
    /// `f64::INFINITY` when the shape has no frontier.
    #[serde(skip)]
    pub source_distance: f64,
    #[serde(skip)]
    pub target_distance: f64,
}

/// Decide where a block released at `dropped_px` lands.
///
/// `source` must already exclude the block being dropped. Both frontiers
/// are rebuilt from the shapes on every call. An empty source shape has no
/// frontier; a source attach then lands on the dropped cell itself.
///
/// A target drop is scored on the snapped drop cell, not on the cell the
/// block attaches to: released diagonally next to a slot, it still lands
/// on the slot but counts as `WrongPosition`.
pub fn resolve_drop(
    dropped_px: PixelPos,
    cell_size: f64,
    source: &Shape,
    target: &Shape,
    slots: Option<TargetSlots>,
) -> Placement {
    let dropped = to_grid(dropped_px, cell_size);

    let (source_cell, source_distance) =
        nearest(&frontier(source), dropped).unwrap_or((dropped, f64::INFINITY));
    let target_best = nearest(&frontier(target), dropped);
    let target_distance = target_best.map_or(f64::INFINITY, |(_, d)| d);

    match target_best {
        Some((target_cell, d)) if d < source_distance && d <= BOUNDARY_LIMIT => {
            let correct = slots.is_some_and(|s| s.contains(dropped));
            Placement {
                dropped,
                zone: Zone::Target,
                cell: target_cell,
                outcome: if correct {
                    PlacementOutcome::CorrectPlacement
                } else {
                    PlacementOutcome::WrongPosition
                },
                source_distance,
                target_distance,
            }
        }
        _ => Placement {
            dropped,
            zone: Zone::Source,
            cell: source_cell,
            outcome: PlacementOutcome::EarlyRelease,
            source_distance,
            target_distance,
        },
    }
}

/// Snap a free-form drop onto the nearest empty cell touching `shape`.
///
/// An empty shape accepts the block wherever it was released.
pub fn snap_to_frontier(dropped_px: PixelPos, cell_size: f64, shape: &Shape) -> GridPoint {
    let dropped = to_grid(dropped_px, cell_size);
    nearest(&frontier(shape), dropped).map_or(dropped, |(cell, _)| cell)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontier::target_slots;
    use crate::geometry::{to_pixel, CELL_SIZE, GRID_LIMIT};
    use crate::types::Orientation;

    fn shape(cells: &[(i32, i32)]) -> Shape {
        Shape::from_cells(cells.iter().map(|&c| GridPoint::from(c)))
    }

    fn px(x: i32, y: i32) -> PixelPos {
        to_pixel(GridPoint::new(x, y), CELL_SIZE)
    }

    /// Source `(0..3, 0)` with its last block lifted, target `(4..7, 0)`.
    fn row_setup() -> (Shape, Shape, Option<TargetSlots>) {
        let source = shape(&[(0, 0), (1, 0)]);
        let target = shape(&[(4, 0), (5, 0), (6, 0)]);
        let slots = target_slots(&target, Orientation::Row);
        (source, target, slots)
    }

    #[test]
    fn test_drop_on_start_slot_is_correct() {
        let (source, target, slots) = row_setup();
        let p = resolve_drop(px(3, 0), CELL_SIZE, &source, &target, slots);
        assert_eq!(p.zone, Zone::Target);
        assert_eq!(p.cell, GridPoint::new(3, 0));
        assert_eq!(p.outcome, PlacementOutcome::CorrectPlacement);
    }

    #[test]
    fn test_drop_beyond_end_slot_is_wrong_position() {
        let (source, target, slots) = row_setup();
        let p = resolve_drop(px(8, 0), CELL_SIZE, &source, &target, slots);
        assert_eq!(p.zone, Zone::Target);
        assert_eq!(p.cell, GridPoint::new(7, 0));
        assert_eq!(p.outcome, PlacementOutcome::WrongPosition);
    }

    #[test]
    fn test_drop_on_side_cell_is_wrong_position() {
        let (source, target, slots) = row_setup();
        let p = resolve_drop(px(5, 1), CELL_SIZE, &source, &target, slots);
        assert_eq!(p.cell, GridPoint::new(5, 1));
        assert_eq!(p.outcome, PlacementOutcome::WrongPosition);
    }

    #[test]
    fn test_diagonal_next_to_slot_attaches_but_is_wrong_position() {
        let (source, target, slots) = row_setup();
        let p = resolve_drop(px(3, 1), CELL_SIZE, &source, &target, slots);
        assert_eq!(p.zone, Zone::Target);
        assert_eq!(p.cell, GridPoint::new(3, 0));
        assert!(slots.unwrap().contains(p.cell));
        assert_eq!(p.outcome, PlacementOutcome::WrongPosition);
    }

    #[test]
    fn test_drop_too_far_from_target_is_early_release() {
        let (source, target, slots) = row_setup();
        // Two cells past the end slot: target frontier is 2 away.
        let p = resolve_drop(px(9, 0), CELL_SIZE, &source, &target, slots);
        assert_eq!(p.zone, Zone::Source);
        assert_eq!(p.outcome, PlacementOutcome::EarlyRelease);
        assert_eq!(p.cell, GridPoint::new(2, 0));
    }

    #[test]
    fn test_drop_near_source_is_early_release() {
        let (source, target, slots) = row_setup();
        let p = resolve_drop(px(0, 1), CELL_SIZE, &source, &target, slots);
        assert_eq!(p.zone, Zone::Source);
        assert_eq!(p.cell, GridPoint::new(0, 1));
        assert_eq!(p.outcome, PlacementOutcome::EarlyRelease);
    }

    #[test]
    fn test_equal_distance_goes_to_source() {
        // (3,0) touches both shapes when the full source is kept.
        let source = shape(&[(0, 0), (1, 0), (2, 0)]);
        let target = shape(&[(4, 0), (5, 0), (6, 0)]);
        let slots = target_slots(&target, Orientation::Row);
        let p = resolve_drop(px(3, 0), CELL_SIZE, &source, &target, slots);
        assert_eq!(p.source_distance, p.target_distance);
        assert_eq!(p.outcome, PlacementOutcome::EarlyRelease);
        assert_eq!(p.cell, GridPoint::new(3, 0));
    }

    #[test]
    fn test_both_far_falls_back_to_source() {
        let (source, target, slots) = row_setup();
        let p = resolve_drop(px(20, 20), CELL_SIZE, &source, &target, slots);
        assert!(p.target_distance < p.source_distance);
        assert!(p.target_distance > BOUNDARY_LIMIT);
        assert_eq!(p.zone, Zone::Source);
        assert_eq!(p.outcome, PlacementOutcome::EarlyRelease);
    }

    #[test]
    fn test_pixel_jitter_snaps_before_resolving() {
        let (source, target, slots) = row_setup();
        let p = resolve_drop(PixelPos::new(162.0, -18.0), CELL_SIZE, &source, &target, slots);
        assert_eq!(p.dropped, GridPoint::new(3, 0));
        assert_eq!(p.outcome, PlacementOutcome::CorrectPlacement);
    }

    #[test]
    fn test_empty_source_lands_on_dropped_cell() {
        let target = shape(&[(4, 0), (5, 0), (6, 0)]);
        let slots = target_slots(&target, Orientation::Row);
        let p = resolve_drop(px(0, 5), CELL_SIZE, &Shape::new(), &target, slots);
        assert_eq!(p.zone, Zone::Source);
        assert_eq!(p.cell, GridPoint::new(0, 5));
        assert!(p.source_distance.is_infinite());
    }

    #[test]
    fn test_extreme_pointer_falls_back_to_source() {
        let (source, target, slots) = row_setup();
        let p = resolve_drop(PixelPos::new(-1.0e12, 0.0), CELL_SIZE, &source, &target, slots);
        assert_eq!(p.dropped, GridPoint::new(-GRID_LIMIT, 0));
        assert_eq!(p.zone, Zone::Source);
        assert_eq!(p.cell, GridPoint::new(-1, 0));
        assert_eq!(p.outcome, PlacementOutcome::EarlyRelease);
    }

    #[test]
    fn test_extreme_snap_keeps_frontier_usable() {
        let cell = snap_to_frontier(PixelPos::new(1.0e12, 0.0), CELL_SIZE, &Shape::new());
        assert_eq!(cell, GridPoint::new(GRID_LIMIT, 0));
        let lone = Shape::from_cells([cell]);
        assert_eq!(frontier(&lone).len(), 4);
        assert_eq!(snap_to_frontier(px(0, 0), CELL_SIZE, &lone), cell.offset(-1, 0));
    }

    #[test]
    fn test_snap_to_frontier() {
        let s = shape(&[(0, 0), (1, 0), (2, 0)]);
        assert_eq!(snap_to_frontier(px(5, 0), CELL_SIZE, &s), GridPoint::new(3, 0));
        assert_eq!(snap_to_frontier(px(1, -3), CELL_SIZE, &s), GridPoint::new(1, -1));
        assert_eq!(snap_to_frontier(px(4, 4), CELL_SIZE, &Shape::new()), GridPoint::new(4, 4));
    }
}
