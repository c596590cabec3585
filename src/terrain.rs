//! Terrain seeding for standalone worlds
//!
//! Elevation is 3D fractal Perlin noise sampled at each region's position on
//! the unit sphere, so there is no seam at the date line or pinch at the
//! poles. The noise is shifted so that a chosen fraction of regions ends up
//! above sea level.

use glam::DVec3;
use noise::{NoiseFn, Perlin, Seedable};
use serde::{Deserialize, Serialize};

use crate::parallel::map_regions;

/// Terrain generation parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Noise octaves (default: 6)
    pub octaves: u32,
    /// Amplitude falloff per octave (0.0-1.0)
    pub persistence: f64,
    /// Frequency growth per octave
    pub lacunarity: f64,
    /// Base noise frequency on the unit sphere
    /// Higher values = more, smaller continents
    pub frequency: f64,
    /// Fraction of regions above sea level (0.0-1.0)
    pub land_fraction: f64,
    /// Height of the highest region
    pub max_elevation: f64,
    /// Depth of the deepest region (positive)
    pub max_depth: f64,
    /// Mean rainfall per region
    pub rainfall: f64,
    /// Relative rainfall variation from noise (0.0 = uniform)
    pub rainfall_variation: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
            frequency: 1.5,
            land_fraction: 0.35,
            max_elevation: 1.0,
            max_depth: 1.0,
            rainfall: 1.0,
            rainfall_variation: 0.0,
        }
    }
}

/// Fractional Brownian Motion in 3D, normalized to roughly [-1, 1].
fn fbm(noise: &Perlin, p: DVec3, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves.max(1) {
        let q = p * frequency;
        total += amplitude * noise.get([q.x, q.y, q.z]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    total / max_value
}

/// Elevation for every region position.
pub fn generate_elevation(positions: &[DVec3], seed: u64, params: &TerrainParams) -> Vec<f64> {
    if positions.is_empty() {
        return Vec::new();
    }

    let noise = Perlin::new(1).set_seed(seed as u32);
    let raw = map_regions(positions.len(), |r| {
        fbm(
            &noise,
            positions[r] * params.frequency,
            params.octaves,
            params.persistence,
            params.lacunarity,
        )
    });

    let mut sorted = raw.clone();
    sorted.sort_by(f64::total_cmp);
    let ocean_fraction = 1.0 - params.land_fraction.clamp(0.0, 1.0);
    let index = ((ocean_fraction * sorted.len() as f64) as usize).min(sorted.len() - 1);
    let sea_level = sorted[index];
    let highest = sorted[sorted.len() - 1];
    let lowest = sorted[0];

    let land_scale = params.max_elevation / (highest - sea_level).max(f64::EPSILON);
    let ocean_scale = params.max_depth / (sea_level - lowest).max(f64::EPSILON);

    raw.iter()
        .map(|&v| {
            let h = v - sea_level;
            if h > 0.0 {
                h * land_scale
            } else {
                h * ocean_scale
            }
        })
        .collect()
}

/// Rainfall for every region: the mean, optionally varied by noise.
pub fn generate_rainfall(positions: &[DVec3], seed: u64, params: &TerrainParams) -> Vec<f64> {
    let variation = params.rainfall_variation.clamp(0.0, 1.0);
    if variation == 0.0 {
        return vec![params.rainfall; positions.len()];
    }

    let noise = Perlin::new(1).set_seed(seed as u32);
    map_regions(positions.len(), |r| {
        let n = fbm(&noise, positions[r] * 2.0, 3, 0.5, 2.0);
        params.rainfall * (1.0 + variation * n).max(0.0)
    })
}
