//! Seed management for world generation
//!
//! Gives each randomized stage its own seed so one stage can be varied while
//! the others stay fixed.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Seeds for the randomized generation stages.
///
/// Each stage gets its own seed, derived from a master seed by default.
/// Individual seeds can be overridden for experimentation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Point jitter on the Fibonacci sphere
    pub points: u64,
    /// Fractal elevation seeding
    pub terrain: u64,
    /// Rainfall variation
    pub rainfall: u64,
}

impl WorldSeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            points: derive_seed(master, "points"),
            terrain: derive_seed(master, "terrain"),
            rainfall: derive_seed(master, "rainfall"),
        }
    }

    /// Create a builder for customizing individual seeds
    pub fn builder(master: u64) -> WorldSeedsBuilder {
        WorldSeedsBuilder::new(master)
    }
}

impl Default for WorldSeeds {
    fn default() -> Self {
        Self::from_master(rand::random())
    }
}

/// Builder for customizing individual seeds while deriving others from master
pub struct WorldSeedsBuilder {
    seeds: WorldSeeds,
}

impl WorldSeedsBuilder {
    pub fn new(master: u64) -> Self {
        Self {
            seeds: WorldSeeds::from_master(master),
        }
    }

    /// Override the point jitter seed
    pub fn points(mut self, seed: u64) -> Self {
        self.seeds.points = seed;
        self
    }

    /// Override the terrain seed
    pub fn terrain(mut self, seed: u64) -> Self {
        self.seeds.terrain = seed;
        self
    }

    /// Override the rainfall seed
    pub fn rainfall(mut self, seed: u64) -> Self {
        self.seeds.rainfall = seed;
        self
    }

    pub fn build(self) -> WorldSeeds {
        self.seeds
    }
}

/// Derive a sub-seed from a master seed and a stage name.
fn derive_seed(master: u64, system: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    system.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for WorldSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "WorldSeeds {{ master: {}, points: {}, terrain: {}, rainfall: {} }}",
            self.master, self.points, self.terrain, self.rainfall,
        )
    }
}
