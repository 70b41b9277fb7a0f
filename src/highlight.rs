//! Highlight animation for movable blocks.
//!
//! The colour is a pure function of elapsed time: it ramps from
//! `BLOCK_COLOR` to `HIGHLIGHTED_BLOCK_COLOR` and back once per period.

use crate::types::BlockColor;

/// Fill of a resting free-form block.
pub const BLOCK_COLOR: BlockColor = BlockColor(0x81E700);

/// Far end of the highlight cycle.
pub const HIGHLIGHTED_BLOCK_COLOR: BlockColor = BlockColor(0x59853B);

/// Milliseconds per highlight cycle.
pub const HIGHLIGHT_PERIOD_MS: u64 = 500;

fn lerp_channel(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 + (b as f64 - a as f64) * t).round() as u8
}

/// Per-channel linear interpolation, `t` in [0, 1].
pub fn lerp_color(from: BlockColor, to: BlockColor, t: f64) -> BlockColor {
    let t = t.clamp(0.0, 1.0);
    let (r0, g0, b0) = from.channels();
    let (r1, g1, b1) = to.channels();
    BlockColor::from_channels(
        lerp_channel(r0, r1, t),
        lerp_channel(g0, g1, t),
        lerp_channel(b0, b1, t),
    )
}

/// Interpolate out and back: `t = 0` and `t = 1` give `from`, `t = 0.5` gives `to`.
pub fn cyclic_lerp_color(from: BlockColor, to: BlockColor, t: f64) -> BlockColor {
    let t = t.rem_euclid(1.0);
    let f = if t < 0.5 { t * 2.0 } else { 2.0 - t * 2.0 };
    lerp_color(from, to, f)
}

/// Colour of every highlighted block at `elapsed_ms`.
pub fn highlight_color(elapsed_ms: u64) -> BlockColor {
    let phase = (elapsed_ms % HIGHLIGHT_PERIOD_MS) as f64 / HIGHLIGHT_PERIOD_MS as f64;
    cyclic_lerp_color(BLOCK_COLOR, HIGHLIGHTED_BLOCK_COLOR, phase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_endpoints() {
        assert_eq!(highlight_color(0), BLOCK_COLOR);
        assert_eq!(highlight_color(HIGHLIGHT_PERIOD_MS / 2), HIGHLIGHTED_BLOCK_COLOR);
        assert_eq!(highlight_color(HIGHLIGHT_PERIOD_MS), BLOCK_COLOR);
    }

    #[test]
    fn test_same_time_same_color() {
        for t in [0, 17, 125, 499, 12_345] {
            assert_eq!(highlight_color(t), highlight_color(t));
        }
    }

    #[test]
    fn test_periodic() {
        assert_eq!(highlight_color(130), highlight_color(130 + 3 * HIGHLIGHT_PERIOD_MS));
    }

    #[test]
    fn test_symmetric_around_midpoint() {
        assert_eq!(highlight_color(100), highlight_color(400));
    }

    #[test]
    fn test_lerp_color_midpoint() {
        let mid = lerp_color(BlockColor(0x000000), BlockColor(0xFF0064), 0.5);
        assert_eq!(mid.channels(), (128, 0, 50));
    }
}
