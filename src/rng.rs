//! WASM-compatible random number generator.
//!
//! Uses the `rand` crate with `SmallRng` (xoshiro256++) which is fast and
//! works with WASM. Entropy is sourced from `getrandom` (browser crypto API).

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// A seedable RNG wrapper for trial generation.
///
/// Can be seeded for deterministic replay, or created from system entropy.
pub struct TaskRng {
    inner: SmallRng,
}

impl TaskRng {
    /// Create from system entropy (browser crypto.getRandomValues or OS).
    pub fn new() -> Self {
        Self {
            inner: SmallRng::from_os_rng(),
        }
    }

    /// Create with a specific seed for deterministic behavior.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// Generate a random usize in [0, max).
    #[inline(always)]
    pub fn gen_range(&mut self, max: usize) -> usize {
        self.inner.random_range(0..max)
    }

    /// Random integer in the half-open range [min, max).
    #[inline(always)]
    pub fn gen_int(&mut self, min: i32, max: i32) -> i32 {
        self.inner.random_range(min..max)
    }

    /// True with probability one half.
    #[inline(always)]
    pub fn coin(&mut self) -> bool {
        self.inner.random_bool(0.5)
    }

    /// Fisher-Yates shuffle in place.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.inner);
    }
}

impl Default for TaskRng {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_deterministic() {
        let mut rng1 = TaskRng::from_seed(42);
        let mut rng2 = TaskRng::from_seed(42);
        for _ in 0..100 {
            assert_eq!(rng1.gen_range(1000), rng2.gen_range(1000));
            assert_eq!(rng1.coin(), rng2.coin());
        }
    }

    #[test]
    fn test_range_bounds() {
        let mut rng = TaskRng::from_seed(123);
        for _ in 0..1000 {
            let v = rng.gen_range(10);
            assert!(v < 10);
            let w = rng.gen_int(2, 7);
            assert!((2..7).contains(&w));
        }
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = TaskRng::from_seed(5);
        let mut items = [1, 2, 3, 4, 5];
        rng.shuffle(&mut items);
        let mut sorted = items;
        sorted.sort_unstable();
        assert_eq!(sorted, [1, 2, 3, 4, 5]);
    }
}
