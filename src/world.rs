//! World state module
//!
//! Bundles the mesh and all per-region data into a single struct, and runs the
//! generation pipeline: points -> mesh -> terrain -> hydrology.

use std::collections::HashSet;

use log::info;

use crate::config::WorldConfig;
use crate::distance::{distance_field, EdgeCost};
use crate::error::WorldError;
use crate::geometry::LatLon;
use crate::graph::RegionId;
use crate::hydrology::{self, HydrologyParams, HydrologyReport, Lake, RegionData};
use crate::mesh::{build_sphere_mesh, SphereMesh};
use crate::points::generate_points;
use crate::seeds::WorldSeeds;
use crate::terrain::{generate_elevation, generate_rainfall};

/// A generated world: the mesh plus everything known about each region
#[derive(Clone, Debug)]
pub struct WorldState {
    /// Seeds used for generation (allows recreation)
    pub seeds: WorldSeeds,
    pub mesh: SphereMesh,
    pub data: RegionData,
    /// Outcome of the last hydrology run
    pub report: HydrologyReport,
}

impl WorldState {
    /// Wrap an existing mesh and region data. Hydrology is not run.
    pub fn new(seeds: WorldSeeds, mesh: SphereMesh, data: RegionData) -> Self {
        Self {
            seeds,
            mesh,
            data,
            report: HydrologyReport::default(),
        }
    }

    /// Convenience accessor for master seed
    pub fn seed(&self) -> u64 {
        self.seeds.master
    }

    pub fn num_regions(&self) -> usize {
        self.mesh.num_regions()
    }

    pub fn lakes(&self) -> &[Lake] {
        &self.report.lakes
    }

    /// Run (or re-run) the hydrology pipeline on the current terrain.
    pub fn assign_hydrology(&mut self, params: &HydrologyParams) -> &HydrologyReport {
        self.report = hydrology::assign_hydrology(&self.mesh, &mut self.data, params);
        &self.report
    }

    /// Check if a region is coastal (land adjacent to ocean)
    pub fn is_coastal(&self, r: RegionId) -> bool {
        if self.data.is_ocean(r) {
            return false;
        }
        self.mesh.neighbors(r).iter().any(|&n| self.data.is_ocean(n))
    }

    /// Great-circle travel distance (radians) from `sources` over land only.
    pub fn land_distance(&self, sources: &[RegionId]) -> Vec<f64> {
        let elevation = &self.data.elevation;
        let mesh = &self.mesh;
        distance_field(mesh, sources, &HashSet::new(), |_, from, to| {
            if elevation[to] <= 0.0 {
                EdgeCost::Blocked
            } else {
                EdgeCost::Cost(mesh.distance(from, to))
            }
        })
    }

    /// Snapshot of everything known about one region
    pub fn region_info(&self, r: RegionId) -> RegionInfo {
        let lake = self.report.lakes.iter().find(|l| l.regions.contains(&r)).map(|l| l.id);
        RegionInfo {
            region: r,
            lat_lon: self.mesh.lat_lon(r),
            elevation: self.data.elevation[r],
            waterpool: self.data.waterpool[r],
            flux: self.data.flux[r],
            rainfall: self.data.rainfall[r],
            moisture: self.data.moisture[r],
            downhill: self.data.downhill[r],
            drainage: self.data.drainage[r],
            waterfall: self.data.waterfall[r],
            degree: self.mesh.degree(r),
            coastal: self.is_coastal(r),
            lake,
        }
    }
}

/// Information about a single region
#[derive(Clone, Debug)]
pub struct RegionInfo {
    pub region: RegionId,
    pub lat_lon: LatLon,
    pub elevation: f64,
    pub waterpool: f64,
    pub flux: f64,
    pub rainfall: f64,
    pub moisture: f64,
    pub downhill: Option<RegionId>,
    pub drainage: Option<RegionId>,
    pub waterfall: bool,
    pub degree: usize,
    pub coastal: bool,
    pub lake: Option<usize>,
}

impl RegionInfo {
    pub fn is_underwater(&self) -> bool {
        self.elevation <= 0.0 || self.waterpool > 0.0
    }
}

/// Generate a complete world from a configuration.
///
/// Runs on a dedicated thread pool when `config.threads > 0`, otherwise on
/// rayon's global pool.
pub fn generate(config: &WorldConfig) -> Result<WorldState, WorldError> {
    if config.threads > 0 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads)
            .build()?;
        pool.install(|| generate_on_current_pool(config))
    } else {
        generate_on_current_pool(config)
    }
}

fn generate_on_current_pool(config: &WorldConfig) -> Result<WorldState, WorldError> {
    let seeds = WorldSeeds::from_master(config.seed);
    info!("Generating world: {} regions, {}", config.num_points, seeds);

    let points = generate_points(seeds.points, config.num_points, config.jitter)?;
    let mesh = build_sphere_mesh(points)?;

    let elevation = generate_elevation(mesh.positions(), seeds.terrain, &config.terrain);
    let rainfall = generate_rainfall(mesh.positions(), seeds.rainfall, &config.terrain);
    let mut data = RegionData::with_elevation(elevation);
    data.rainfall = rainfall;

    let land = (0..data.len()).filter(|&r| !data.is_ocean(r)).count();
    info!("Terrain: {} of {} regions above sea level", land, data.len());

    let mut world = WorldState::new(seeds, mesh, data);
    world.assign_hydrology(&config.hydrology);
    Ok(world)
}
