//! Configuration for world generation.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::hydrology::{HydrologyParams, HydrologyPreset};
use crate::terrain::TerrainParams;

/// Everything needed to generate a world. Missing JSON fields take their
/// defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Master seed; every stage seed is derived from it.
    pub seed: u64,

    /// Number of regions on the sphere (default: 10000).
    pub num_points: usize,

    /// Point jitter as a fraction of local spacing (0.0-1.0).
    pub jitter: f64,

    /// Worker threads for parallel scans. 0 uses rayon's global pool.
    pub threads: usize,

    pub terrain: TerrainParams,

    pub hydrology: HydrologyParams,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_points: 10_000,
            jitter: 0.75,
            threads: 0,
            terrain: TerrainParams::default(),
            hydrology: HydrologyParams::default(),
        }
    }
}

impl WorldConfig {
    pub fn new(seed: u64, num_points: usize) -> Self {
        Self {
            seed,
            num_points,
            ..Default::default()
        }
    }

    /// Replace the hydrology parameters with a preset.
    pub fn with_preset(mut self, preset: HydrologyPreset) -> Self {
        self.hydrology = HydrologyParams::from_preset(preset);
        self
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Load a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json() {
        let config = WorldConfig::from_json(r#"{ "seed": 17, "num_points": 500 }"#).unwrap();
        assert_eq!(config.seed, 17);
        assert_eq!(config.num_points, 500);
        assert_eq!(config.jitter, 0.75);
        assert_eq!(config.hydrology, HydrologyParams::default());
    }

    #[test]
    fn test_nested_overrides() {
        let json = r#"{ "hydrology": { "lakes": false }, "terrain": { "land_fraction": 0.5 } }"#;
        let config = WorldConfig::from_json(json).unwrap();
        assert!(!config.hydrology.lakes);
        assert_eq!(config.hydrology.attempts, 3);
        assert_eq!(config.terrain.land_fraction, 0.5);
    }

    #[test]
    fn test_json_round_trip() {
        let config = WorldConfig::new(99, 1234).with_preset(HydrologyPreset::Wet);
        let back = WorldConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.json");
        fs::write(&path, r#"{ "seed": 5 }"#).unwrap();
        assert_eq!(WorldConfig::load(&path).unwrap().seed, 5);

        fs::write(&path, "not json").unwrap();
        let err = WorldConfig::load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
