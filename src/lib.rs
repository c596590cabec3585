//! Planet mesh library
//!
//! Spherical region mesh, multi-source distance fields and hydrology for
//! procedurally generated planets.

pub mod config;
pub mod distance;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod hydrology;
pub mod mesh;
pub mod parallel;
pub mod persistence;
pub mod points;
pub mod seeds;
pub mod terrain;
pub mod world;

pub use config::WorldConfig;
pub use distance::{distance_field, distance_field_scored, DistanceField, EdgeCost};
pub use error::{MeshError, WorldError};
pub use geometry::LatLon;
pub use graph::{AdjacencyGraph, RegionGraph, RegionId, SideId, TriangleId};
pub use hydrology::{assign_hydrology, HydrologyParams, HydrologyPreset, HydrologyReport, RegionData};
pub use mesh::{build_sphere_mesh, SphereMesh};
pub use points::generate_points;
pub use seeds::WorldSeeds;
pub use world::{generate, RegionInfo, WorldState};
