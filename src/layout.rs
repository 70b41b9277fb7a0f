//! Trial generation: where the source and target clusters sit and how the
//! source blocks are coloured.
//!
//! One cluster sits at the origin and the other at a random offset. Both are
//! straight runs of `CLUSTER_LEN` cells along the trial's orientation.

use crate::rng::TaskRng;
use crate::types::{BlockColor, GridPoint, Orientation, Shape};
use serde::Serialize;

/// Cells per cluster.
pub const CLUSTER_LEN: usize = 3;

/// Colours dealt to the source blocks (shuffled per trial).
pub const SOURCE_COLORS: [BlockColor; CLUSTER_LEN] = [
    BlockColor(0xD7191C),
    BlockColor(0xFDAE61),
    BlockColor(0xABD9E9),
];

/// Colour of every target block, and the only colour a player may drag.
pub const TARGET_COLOR: BlockColor = BlockColor(0xFDAE61);

/// Random variables of one trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialLayout {
    pub orientation: Orientation,
    /// Origin of whichever cluster is not at (0, 0).
    pub offset: GridPoint,
    /// True when the source cluster is the one at (0, 0).
    pub source_first: bool,
    pub source_colors: [BlockColor; CLUSTER_LEN],
}

impl TrialLayout {
    /// Draw a fresh layout.
    ///
    /// Row trials offset the far cluster by x in [2, 3) and y in [2, 7);
    /// column trials by x in [2, 8) and y in [2, 3).
    pub fn random(rng: &mut TaskRng) -> Self {
        let orientation = if rng.coin() {
            Orientation::Row
        } else {
            Orientation::Column
        };
        let offset = match orientation {
            Orientation::Row => GridPoint::new(rng.gen_int(2, 3), rng.gen_int(2, 7)),
            Orientation::Column => GridPoint::new(rng.gen_int(2, 8), rng.gen_int(2, 3)),
        };
        let source_first = rng.coin();
        let mut source_colors = SOURCE_COLORS;
        rng.shuffle(&mut source_colors);

        Self {
            orientation,
            offset,
            source_first,
            source_colors,
        }
    }

    fn cluster(&self, at_origin: bool) -> Shape {
        let origin = if at_origin {
            GridPoint::new(0, 0)
        } else {
            self.offset
        };
        Shape::line(origin, CLUSTER_LEN, self.orientation)
    }

    /// Source cells with their colours, in layout order.
    pub fn source_blocks(&self) -> Vec<(GridPoint, BlockColor)> {
        self.cluster(self.source_first)
            .cells()
            .iter()
            .copied()
            .zip(self.source_colors)
            .collect()
    }

    pub fn source_shape(&self) -> Shape {
        self.cluster(self.source_first)
    }

    pub fn target_shape(&self) -> Shape {
        self.cluster(!self.source_first)
    }
}
