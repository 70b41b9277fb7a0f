//! Core data types for the block-manipulation core.
//!
//! Grid cells are sparse integer points; there is no bounded board.
//! Pixel positions are stage-relative `f64` pairs.

use serde::{Deserialize, Serialize};

/// Bit-pack (x, y) into a single u64 key for hash lookups.
#[inline(always)]
pub fn cell_key(p: GridPoint) -> u64 {
    ((p.x as u32 as u64) << 32) | (p.y as u32 as u64)
}

/// One discrete grid cell. Compared by value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The four axis neighbours in enumeration order: left, right, up, down.
    #[inline]
    pub fn neighbors(self) -> [GridPoint; 4] {
        [
            GridPoint::new(self.x - 1, self.y),
            GridPoint::new(self.x + 1, self.y),
            GridPoint::new(self.x, self.y - 1),
            GridPoint::new(self.x, self.y + 1),
        ]
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        GridPoint::new(self.x + dx, self.y + dy)
    }

    pub fn to_array(self) -> [i32; 2] {
        [self.x, self.y]
    }
}

impl From<(i32, i32)> for GridPoint {
    fn from((x, y): (i32, i32)) -> Self {
        GridPoint::new(x, y)
    }
}

/// Continuous stage-relative pointer position in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelPos {
    pub x: f64,
    pub y: f64,
}

impl PixelPos {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis along which a trial's clusters are laid out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    Row,
    Column,
}

impl Orientation {
    /// Unit step along the major axis.
    pub fn step(self) -> (i32, i32) {
        match self {
            Orientation::Row => (1, 0),
            Orientation::Column => (0, 1),
        }
    }

    /// Coordinate of `p` along the major axis.
    pub fn axis_of(self, p: GridPoint) -> i32 {
        match self {
            Orientation::Row => p.x,
            Orientation::Column => p.y,
        }
    }
}

/// Which set of blocks a dragged block belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockLayer {
    /// Source cluster of the current trial.
    Source,
    /// The player's free-form shape.
    Own,
}

/// 24-bit RGB colour, `0xRRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockColor(pub u32);

impl BlockColor {
    #[inline]
    pub fn channels(self) -> (u8, u8, u8) {
        ((self.0 >> 16) as u8, (self.0 >> 8) as u8, self.0 as u8)
    }

    #[inline]
    pub fn from_channels(r: u8, g: u8, b: u8) -> Self {
        BlockColor(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }
}

/// Ordered sequence of unique occupied cells.
///
/// Insertion order is kept; duplicate inserts are ignored so the
/// uniqueness invariant holds at every mutation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<GridPoint>", into = "Vec<GridPoint>")]
pub struct Shape {
    cells: Vec<GridPoint>,
}

impl Shape {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }

    /// Build a shape from any cell sequence, dropping repeated points.
    pub fn from_cells<I>(cells: I) -> Self
    where
        I: IntoIterator<Item = GridPoint>,
    {
        let mut shape = Shape::new();
        for c in cells {
            shape.insert(c);
        }
        shape
    }

    /// Straight run of `len` cells starting at `origin` along `orientation`.
    pub fn line(origin: GridPoint, len: usize, orientation: Orientation) -> Self {
        let (dx, dy) = orientation.step();
        Shape::from_cells((0..len as i32).map(|i| origin.offset(dx * i, dy * i)))
    }

    #[inline]
    pub fn cells(&self) -> &[GridPoint] {
        &self.cells
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, p: GridPoint) -> bool {
        self.cells.contains(&p)
    }

    pub fn position(&self, p: GridPoint) -> Option<usize> {
        self.cells.iter().position(|&c| c == p)
    }

    /// Append `p`. Returns false if it was already present.
    pub fn insert(&mut self, p: GridPoint) -> bool {
        if self.contains(p) {
            return false;
        }
        self.cells.push(p);
        true
    }

    /// Remove `p` by value. Returns false if it was absent.
    pub fn remove(&mut self, p: GridPoint) -> bool {
        match self.position(p) {
            Some(idx) => {
                self.cells.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Copy of this shape without `p`.
    pub fn without(&self, p: GridPoint) -> Shape {
        Shape {
            cells: self.cells.iter().copied().filter(|&c| c != p).collect(),
        }
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Inclusive bounding box `(min, max)`, or `None` for an empty shape.
    pub fn bounds(&self) -> Option<(GridPoint, GridPoint)> {
        let first = *self.cells.first()?;
        let mut min = first;
        let mut max = first;
        for c in &self.cells[1..] {
            min.x = min.x.min(c.x);
            min.y = min.y.min(c.y);
            max.x = max.x.max(c.x);
            max.y = max.y.max(c.y);
        }
        Some((min, max))
    }

    /// Coordinate-pair form used in telemetry payloads.
    pub fn to_pairs(&self) -> Vec<[i32; 2]> {
        self.cells.iter().map(|c| c.to_array()).collect()
    }
}

impl From<Vec<GridPoint>> for Shape {
    fn from(cells: Vec<GridPoint>) -> Self {
        Shape::from_cells(cells)
    }
}

impl From<Shape> for Vec<GridPoint> {
    fn from(shape: Shape) -> Self {
        shape.cells
    }
}
