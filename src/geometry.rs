//! Grid geometry: pixel/grid conversion, adjacency, distances.
//!
//! All functions are pure. Cell size is the side length of one block in
//! pixels (`CELL_SIZE` in the running task).

use crate::types::{GridPoint, PixelPos};

/// Side length of one block in pixels.
pub const CELL_SIZE: f64 = 50.0;

/// Stage size the front end lays blocks out on.
pub const STAGE_WIDTH: f64 = 960.0;
pub const STAGE_HEIGHT: f64 = 540.0;

/// Largest absolute grid coordinate `to_grid` produces. Leaves headroom so
/// neighbour and offset arithmetic on snapped cells cannot overflow.
pub const GRID_LIMIT: i32 = i32::MAX / 4;

/// Round half up, so `-0.5` snaps to `0` and `0.5` snaps to `1`.
#[inline(always)]
fn round_half_up(v: f64) -> i32 {
    let limit = GRID_LIMIT as f64;
    (v + 0.5).floor().clamp(-limit, limit) as i32
}

/// Snap a pixel position to the nearest grid cell.
///
/// Far-off positions saturate at `GRID_LIMIT` on each axis.
pub fn to_grid(pixel: PixelPos, cell_size: f64) -> GridPoint {
    GridPoint::new(
        round_half_up(pixel.x / cell_size),
        round_half_up(pixel.y / cell_size),
    )
}

/// Pixel position of a cell's centre.
pub fn to_pixel(cell: GridPoint, cell_size: f64) -> PixelPos {
    PixelPos::new(cell.x as f64 * cell_size, cell.y as f64 * cell_size)
}

/// True iff `a` and `b` share an edge (4-connectivity, no diagonals).
#[inline(always)]
pub fn manhattan_adjacent(a: GridPoint, b: GridPoint) -> bool {
    let dx = (a.x as i64 - b.x as i64).abs();
    let dy = (a.y as i64 - b.y as i64).abs();
    (dx == 1 && dy == 0) || (dx == 0 && dy == 1)
}

#[inline(always)]
pub fn chebyshev_distance(a: GridPoint, b: GridPoint) -> i64 {
    (a.x as i64 - b.x as i64)
        .abs()
        .max((a.y as i64 - b.y as i64).abs())
}

/// Straight-line distance between cell centres, in cells.
///
/// This is the metric the placement resolver ranks frontier cells by and
/// compares against the one-cell boundary.
#[inline(always)]
pub fn euclidean_distance(a: GridPoint, b: GridPoint) -> f64 {
    let dx = a.x as f64 - b.x as f64;
    let dy = a.y as f64 - b.y as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Translation that centres the bounding box of `cells` on the stage.
///
/// Returns the stage centre when there is nothing to centre.
pub fn centering_offset(cells: &[GridPoint], cell_size: f64) -> PixelPos {
    let centre = PixelPos::new(STAGE_WIDTH / 2.0, STAGE_HEIGHT / 2.0);
    let Some(first) = cells.first() else {
        return centre;
    };
    let (mut min, mut max) = (*first, *first);
    for c in cells {
        min.x = min.x.min(c.x);
        min.y = min.y.min(c.y);
        max.x = max.x.max(c.x);
        max.y = max.y.max(c.y);
    }
    let lo = to_pixel(min, cell_size);
    let hi = to_pixel(max, cell_size);
    PixelPos::new(centre.x - (lo.x + hi.x) / 2.0, centre.y - (lo.y + hi.y) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_integer_points() {
        for x in -15..15 {
            for y in -15..15 {
                let p = GridPoint::new(x, y);
                assert_eq!(to_grid(to_pixel(p, CELL_SIZE), CELL_SIZE), p);
                assert_eq!(to_grid(to_pixel(p, 7.5), 7.5), p);
            }
        }
    }

    #[test]
    fn test_to_grid_snaps_to_nearest() {
        assert_eq!(to_grid(PixelPos::new(74.0, 26.0), CELL_SIZE), GridPoint::new(1, 1));
        assert_eq!(to_grid(PixelPos::new(24.9, -24.9), CELL_SIZE), GridPoint::new(0, 0));
        assert_eq!(to_grid(PixelPos::new(-76.0, 130.0), CELL_SIZE), GridPoint::new(-2, 3));
    }

    #[test]
    fn test_to_grid_half_rounds_up() {
        assert_eq!(to_grid(PixelPos::new(25.0, -25.0), CELL_SIZE), GridPoint::new(1, 0));
    }

    #[test]
    fn test_to_grid_saturates_far_positions() {
        let far = to_grid(PixelPos::new(-1.0e12, 1.0e300), CELL_SIZE);
        assert_eq!(far, GridPoint::new(-GRID_LIMIT, GRID_LIMIT));
        for n in far.neighbors() {
            assert!(manhattan_adjacent(far, n));
        }
    }

    #[test]
    fn test_distances_across_full_range() {
        let a = GridPoint::new(i32::MIN, 0);
        let b = GridPoint::new(i32::MAX, 0);
        assert_eq!(chebyshev_distance(a, b), u32::MAX as i64);
        assert!((euclidean_distance(a, b) - u32::MAX as f64).abs() < 1.0);
        assert!(!manhattan_adjacent(a, b));
    }

    #[test]
    fn test_manhattan_adjacent() {
        let o = GridPoint::new(0, 0);
        for n in o.neighbors() {
            assert!(manhattan_adjacent(o, n));
        }
        assert!(!manhattan_adjacent(o, o));
        assert!(!manhattan_adjacent(o, GridPoint::new(1, 1)));
        assert!(!manhattan_adjacent(o, GridPoint::new(2, 0)));
    }

    #[test]
    fn test_distances() {
        let a = GridPoint::new(0, 0);
        let b = GridPoint::new(3, 4);
        assert_eq!(chebyshev_distance(a, b), 4);
        assert!((euclidean_distance(a, b) - 5.0).abs() < 1e-12);
        assert_eq!(euclidean_distance(a, a), 0.0);
    }

    #[test]
    fn test_centering_offset() {
        let cells = [GridPoint::new(0, 0), GridPoint::new(2, 0)];
        assert_eq!(centering_offset(&cells, CELL_SIZE), PixelPos::new(430.0, 270.0));
        assert_eq!(centering_offset(&[], CELL_SIZE), PixelPos::new(480.0, 270.0));
    }
}
