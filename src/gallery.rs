//! Collected shapes and the favourite selection made from them.

use crate::events::Rejection;
use crate::types::Shape;
use serde::Serialize;

/// Number of favourites the player must pick.
pub const SELECTION_SIZE: usize = 5;

pub const GALLERY_ROWS: usize = 5;
pub const GALLERY_COLS: usize = 10;
pub const ITEMS_PER_PAGE: usize = GALLERY_ROWS * GALLERY_COLS;

/// Reference duration for the search score, in milliseconds.
const SCORE_REFERENCE_MS: f64 = 720_000.0;
/// Shape count that maps to a neutral score at the reference duration.
const SCORE_REFERENCE_SHAPES: f64 = 88.0;

/// Append-only list of shape snapshots.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Gallery {
    shapes: Vec<Shape>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a snapshot and return its index.
    pub fn push(&mut self, shape: Shape) -> usize {
        self.shapes.push(shape);
        self.shapes.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Shape> {
        self.shapes.get(index)
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn page_count(&self) -> usize {
        self.shapes.len().div_ceil(ITEMS_PER_PAGE)
    }

    pub fn page_of(index: usize) -> usize {
        index / ITEMS_PER_PAGE
    }

    /// `(row, col)` of an entry within its page.
    pub fn cell_of(index: usize) -> (usize, usize) {
        let within = index % ITEMS_PER_PAGE;
        (within / GALLERY_COLS, within % GALLERY_COLS)
    }

    /// Indices shown on `page`.
    pub fn page(&self, page: usize) -> std::ops::Range<usize> {
        let start = (page * ITEMS_PER_PAGE).min(self.shapes.len());
        let end = (start + ITEMS_PER_PAGE).min(self.shapes.len());
        start..end
    }
}

/// Favourites picked during gallery review, in the order chosen.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Selection {
    indices: Vec<usize>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle `index`. Returns whether it is selected afterwards.
    ///
    /// Selecting a sixth entry is rejected and leaves the selection as is.
    pub fn toggle(&mut self, index: usize, gallery_len: usize) -> Result<bool, Rejection> {
        if index >= gallery_len {
            return Err(Rejection::OutOfRange);
        }
        if let Some(pos) = self.indices.iter().position(|&i| i == index) {
            self.indices.remove(pos);
            return Ok(false);
        }
        if self.indices.len() >= SELECTION_SIZE {
            return Err(Rejection::SelectionFull);
        }
        self.indices.push(index);
        Ok(true)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.indices.len() == SELECTION_SIZE
    }
}

/// Search-style score in (-inf, 1]: positive for rapid, broad search and
/// negative for slow, focused search.
pub fn search_score(shape_count: usize, time_played_ms: u64) -> f64 {
    if time_played_ms == 0 {
        return 1.0;
    }
    let rate = shape_count as f64 / SCORE_REFERENCE_SHAPES
        * (SCORE_REFERENCE_MS / time_played_ms as f64);
    (2.0 * (rate - 0.5)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridPoint;

    fn dot(x: i32) -> Shape {
        Shape::from_cells([GridPoint::new(x, 0)])
    }

    #[test]
    fn test_gallery_append_and_index() {
        let mut g = Gallery::new();
        assert_eq!(g.push(dot(0)), 0);
        assert_eq!(g.push(dot(1)), 1);
        assert_eq!(g.get(1), Some(&dot(1)));
        assert_eq!(g.get(2), None);
    }

    #[test]
    fn test_paging() {
        let mut g = Gallery::new();
        assert_eq!(g.page_count(), 0);
        for i in 0..51 {
            g.push(dot(i));
        }
        assert_eq!(g.page_count(), 2);
        assert_eq!(g.page(0), 0..50);
        assert_eq!(g.page(1), 50..51);
        assert_eq!(Gallery::page_of(49), 0);
        assert_eq!(Gallery::page_of(50), 1);
        assert_eq!(Gallery::cell_of(23), (2, 3));
        assert_eq!(Gallery::cell_of(50), (0, 0));
    }

    #[test]
    fn test_selection_caps_at_five() {
        let mut s = Selection::new();
        for i in 0..5 {
            assert_eq!(s.toggle(i, 8), Ok(true));
        }
        assert!(s.is_complete());
        assert_eq!(s.toggle(5, 8), Err(Rejection::SelectionFull));
        assert_eq!(s.len(), 5);
        assert!(!s.contains(5));

        // deselecting frees a slot
        assert_eq!(s.toggle(2, 8), Ok(false));
        assert_eq!(s.toggle(5, 8), Ok(true));
        assert_eq!(s.indices(), &[0, 1, 3, 4, 5]);
    }

    #[test]
    fn test_selection_out_of_range() {
        let mut s = Selection::new();
        assert_eq!(s.toggle(3, 3), Err(Rejection::OutOfRange));
        assert!(s.is_empty());
    }

    #[test]
    fn test_search_score() {
        // 88 shapes in 12 minutes: rate 1 -> score 1
        assert!((search_score(88, 720_000) - 1.0).abs() < 1e-9);
        // 44 shapes in 12 minutes: rate 0.5 -> score 0
        assert!(search_score(44, 720_000).abs() < 1e-9);
        assert!(search_score(10, 720_000) < 0.0);
        assert_eq!(search_score(500, 60_000), 1.0);
    }
}
