//! Injectable randomness for the browse and "featured" selections.
//!
//! The engines never reach for an ambient RNG; callers pass a [`RandomSource`]
//! so tests can supply a seed or a fixed sequence.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

/// Source of uniform random indices
pub trait RandomSource {
    /// Uniform index in `0..upper`. Callers never pass `upper == 0`.
    fn next_index(&mut self, upper: usize) -> usize;
}

/// [`RandomSource`] backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R>(R);

impl<R: Rng> RngSource<R> {
    pub fn from_rng(rng: R) -> Self {
        Self(rng)
    }
}

impl RngSource<ThreadRng> {
    /// Thread-local generator, for production use
    pub fn thread() -> Self {
        Self(rand::rng())
    }
}

impl RngSource<StdRng> {
    /// Deterministic generator
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_index(&mut self, upper: usize) -> usize {
        self.0.random_range(0..upper)
    }
}

/// Uniform in-place Fisher-Yates shuffle
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        let j = rng.next_index(i + 1);
        items.swap(i, j);
    }
}

/// Uniform sample of up to `count` items, in random order
pub fn sample<T: Clone>(items: &[T], count: usize, rng: &mut dyn RandomSource) -> Vec<T> {
    let mut pool = items.to_vec();
    shuffle(&mut pool, rng);
    pool.truncate(count);
    pool
}
