//! Error types for mesh construction and world generation.

use thiserror::Error;

/// Failures while building the spherical mesh.
///
/// These are construction errors: the caller has to pick different inputs,
/// nothing here is retried.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("need at least {required} points, got {got}")]
    TooFewPoints { required: usize, got: usize },

    #[error("region {region} has a non-finite coordinate ({lat}, {lon})")]
    InvalidPoint { region: usize, lat: f64, lon: f64 },

    #[error("triangulation failed: {0}")]
    Triangulation(String),

    #[error("pole stitching visited {visited} of {expected} hull sides")]
    OpenHull { visited: usize, expected: usize },

    #[error("inconsistent topology: {0}")]
    Topology(String),
}

/// Failures of the full generation pipeline.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error("could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
