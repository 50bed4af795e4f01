//! Seedable random source.
//!
//! Every random decision in the engine (initial spawns, respawn location and
//! heading, food placement) draws from the single [`ArenaRng`] owned by the
//! arena, so two arenas built from the same config and seed stay in lockstep.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::grid::Direction;

/// Deterministic RNG wrapper.
#[derive(Debug, Clone)]
pub struct ArenaRng {
    rng: StdRng,
    seed: u64,
}

impl ArenaRng {
    /// Create an RNG from a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this RNG was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform sample from a range.
    pub fn random_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distr::uniform::SampleUniform,
        R: rand::distr::uniform::SampleRange<T>,
    {
        self.rng.random_range(range)
    }

    /// Uniformly random cardinal direction.
    pub fn direction(&mut self) -> Direction {
        Direction::ALL[self.rng.random_range(0..Direction::ALL.len())]
    }
}
