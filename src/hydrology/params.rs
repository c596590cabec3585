//! Hydrology parameters and presets

use serde::{Deserialize, Serialize};

/// How wet the planet's drainage behaves
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HydrologyPreset {
    /// Few lakes, little erosion
    Dry,
    /// Balanced
    #[default]
    Normal,
    /// Large lakes, strong river incision
    Wet,
}

impl HydrologyPreset {
    pub fn all() -> &'static [Self] {
        &[Self::Dry, Self::Normal, Self::Wet]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Dry => "Few lakes, little erosion",
            Self::Normal => "Balanced drainage",
            Self::Wet => "Large lakes, deep river valleys",
        }
    }
}

impl std::fmt::Display for HydrologyPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dry => write!(f, "dry"),
            Self::Normal => write!(f, "normal"),
            Self::Wet => write!(f, "wet"),
        }
    }
}

/// Hydrology pass parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrologyParams {
    /// Height a filled sink is raised above its spill level (default: 1e-4)
    /// Must be positive so every filled region drains strictly downhill
    pub fill_epsilon: f64,

    /// Fraction of the drop to the downhill neighbor removed per erosion pass
    /// at maximum flux (0.0-1.0)
    pub erosion_coefficient: f64,

    /// Number of fill -> downhill -> flux -> erode rounds (default: 3)
    pub attempts: usize,

    /// Leave ocean regions without a downhill neighbor
    pub skip_below_sea: bool,

    /// Flood closed basins into lakes before filling sinks
    pub lakes: bool,

    /// Multiplier on the flux arriving at a sink to get the water volume
    /// available to its lake
    pub lake_inflow_factor: f64,

    /// Upper bound on how many boundary regions a single lake may absorb
    pub lake_max_raises: usize,

    /// Normalized slope (0.0-1.0, relative to the steepest land slope) above
    /// which a region may be a waterfall
    pub waterfall_slope: f64,

    /// Flux must exceed this many times the local rainfall for a waterfall
    pub waterfall_flux_factor: f64,

    /// Flux must exceed this many times the local rainfall for a river
    pub river_flux_factor: f64,
}

impl Default for HydrologyParams {
    fn default() -> Self {
        Self {
            fill_epsilon: 1e-4,
            erosion_coefficient: 0.01,
            attempts: 3,
            skip_below_sea: true,
            lakes: true,
            lake_inflow_factor: 0.01,
            lake_max_raises: 10_000,
            waterfall_slope: 0.9,
            waterfall_flux_factor: 2.0,
            river_flux_factor: 8.0,
        }
    }
}

impl HydrologyParams {
    pub fn from_preset(preset: HydrologyPreset) -> Self {
        match preset {
            HydrologyPreset::Dry => Self {
                erosion_coefficient: 0.005,
                attempts: 2,
                lake_inflow_factor: 0.002,
                river_flux_factor: 12.0,
                ..Default::default()
            },
            HydrologyPreset::Normal => Self::default(),
            HydrologyPreset::Wet => Self {
                erosion_coefficient: 0.03,
                attempts: 5,
                lake_inflow_factor: 0.05,
                river_flux_factor: 5.0,
                ..Default::default()
            },
        }
    }

    /// No erosion, no lakes: only routing.
    pub fn routing_only() -> Self {
        Self {
            erosion_coefficient: 0.0,
            attempts: 0,
            lakes: false,
            ..Default::default()
        }
    }
}
