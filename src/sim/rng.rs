//! Seeded random source for the simulation.

use rand::prelude::*;
use rand::rngs::StdRng;

/// Seeded random number generator for deterministic simulation.
///
/// Every random decision in the core (crit rolls, patrol points, idle wake-ups,
/// loot) goes through this type. When a seed is provided, the same seed and
/// the same inputs always produce the same run.
pub struct GameRng {
    rng: StdRng,
    /// `None` when seeded from entropy
    pub seed: Option<u64>,
}

impl GameRng {
    /// Reproducible stream: the same seed always yields the same rolls.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Uniform in `[0, 1)`
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Uniform in `[min, max)`
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.random_f32() * (max - min)
    }

    /// Generate a random integer in `[min, max]`. Returns `min` if the range is inverted.
    pub fn random_u32_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    /// Roll against a probability. `chance <= 0` never succeeds, `chance >= 1` always does.
    pub fn roll(&mut self, chance: f32) -> bool {
        self.random_f32() < chance
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}
