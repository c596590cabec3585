//! Sphere mesh construction
//!
//! 1. Rotate the points so one of them (the pole) sits at (0, 0, 1).
//! 2. Project every other point stereographically onto the plane.
//! 3. Delaunay-triangulate the plane.
//! 4. Close the hole the projection leaves around the pole by fanning new
//!    triangles from every convex hull edge to the pole point.
//!
//! Step 4 has to follow the hull in order so each new triangle is paired with
//! its predecessor and successor; pairing them any other way silently breaks
//! every neighbor query built on top.

use delaunator::{triangulate, Point, EMPTY};
use glam::DVec3;
use log::{debug, info};

use crate::error::MeshError;
use crate::geometry::{lat_lon_to_xyz, rotation_to_north, stereographic_project, LatLon};
use crate::graph::{RegionId, SideId};

use super::half_edge::{next_side_in_triangle, TriangleMesh};
use super::SphereMesh;

/// Fewest points that close into a sphere (a tetrahedron).
pub const MIN_POINTS: usize = 4;

/// Build the mesh for a set of points on the sphere.
pub fn build_sphere_mesh(lat_lon: Vec<LatLon>) -> Result<SphereMesh, MeshError> {
    let num_regions = lat_lon.len();
    if num_regions < MIN_POINTS {
        return Err(MeshError::TooFewPoints {
            required: MIN_POINTS,
            got: num_regions,
        });
    }
    if let Some(region) = lat_lon.iter().position(|p| !p.lat.is_finite() || !p.lon.is_finite()) {
        let p = lat_lon[region];
        return Err(MeshError::InvalidPoint {
            region,
            lat: p.lat,
            lon: p.lon,
        });
    }

    let positions: Vec<DVec3> = lat_lon.iter().map(|&p| lat_lon_to_xyz(p)).collect();
    let pole = pick_pole(&positions);

    let (mut triangles, mut halfedges) = triangulate_projected(&positions, pole)?;
    let hull_sides = stitch_pole(pole, num_regions, &mut triangles, &mut halfedges)?;

    debug!(
        "Stitched {} hull sides to pole region {} ({} triangles)",
        hull_sides,
        pole,
        triangles.len() / 3
    );

    let topology = TriangleMesh::from_parts(num_regions, triangles, halfedges)?;
    let mesh = SphereMesh::from_parts(topology, lat_lon, positions, pole);

    info!(
        "Built sphere mesh: {} regions, {} triangles, {} edges",
        mesh.num_regions(),
        mesh.num_triangles(),
        mesh.num_edges()
    );

    Ok(mesh)
}

/// The point closest to +Z becomes the projection pole.
fn pick_pole(positions: &[DVec3]) -> RegionId {
    let mut pole = 0;
    for (r, p) in positions.iter().enumerate() {
        if p.z > positions[pole].z {
            pole = r;
        }
    }
    pole
}

/// Project all non-pole points and triangulate them.
///
/// Returns side arrays indexed by region id. Unpaired hull sides keep
/// `delaunator::EMPTY` as their opposite.
fn triangulate_projected(
    positions: &[DVec3],
    pole: RegionId,
) -> Result<(Vec<RegionId>, Vec<SideId>), MeshError> {
    let rotation = rotation_to_north(positions[pole]);

    let mut projected = Vec::with_capacity(positions.len() - 1);
    let mut region_of_point = Vec::with_capacity(positions.len() - 1);
    for (r, &p) in positions.iter().enumerate() {
        if r == pole {
            continue;
        }
        let flat = stereographic_project(rotation * p).ok_or_else(|| {
            MeshError::Triangulation(format!("region {} coincides with the pole region {}", r, pole))
        })?;
        if !flat.is_finite() {
            return Err(MeshError::Triangulation(format!(
                "region {} projects to a non-finite point",
                r
            )));
        }
        projected.push(Point { x: flat.x, y: flat.y });
        region_of_point.push(r);
    }

    let triangulation = triangulate(&projected);
    if triangulation.triangles.is_empty() {
        return Err(MeshError::Triangulation(format!(
            "no triangles for {} projected points (all collinear?)",
            projected.len()
        )));
    }

    let triangles: Vec<RegionId> = triangulation
        .triangles
        .iter()
        .map(|&i| region_of_point[i])
        .collect();

    // Duplicate points are dropped by the triangulator and would leave a
    // region with no triangles.
    let mut used = vec![false; positions.len()];
    for &r in &triangles {
        used[r] = true;
    }
    if let Some(r) = (0..positions.len()).find(|&r| r != pole && !used[r]) {
        return Err(MeshError::Triangulation(format!(
            "region {} was dropped (duplicate or degenerate point)",
            r
        )));
    }

    Ok((triangles, triangulation.halfedges))
}

/// Close the mesh by connecting every unpaired hull side to the pole.
///
/// For the i-th hull side `s` (walking the hull via "the unpaired side that
/// starts where `s` ends") a triangle `[end(s), start(s), pole]` is appended at
/// `t = num_sides + 3i`:
/// - side `t` runs opposite to `s`,
/// - side `t + 2` (pole -> end(s)) pairs with side `t' + 1` (end(s) -> pole) of
///   the next pole triangle, wrapping around at the end of the hull.
///
/// Returns the number of hull sides stitched.
fn stitch_pole(
    pole: RegionId,
    num_regions: usize,
    triangles: &mut Vec<RegionId>,
    halfedges: &mut Vec<SideId>,
) -> Result<usize, MeshError> {
    let num_sides = triangles.len();

    let mut unpaired_from: Vec<Option<SideId>> = vec![None; num_regions];
    let mut first_unpaired = None;
    let mut num_unpaired = 0;
    for s in 0..num_sides {
        if halfedges[s] != EMPTY {
            continue;
        }
        let start = triangles[s];
        if unpaired_from[start].is_some() {
            return Err(MeshError::Topology(format!(
                "region {} starts more than one hull side",
                start
            )));
        }
        unpaired_from[start] = Some(s);
        first_unpaired.get_or_insert(s);
        num_unpaired += 1;
    }

    let first = match first_unpaired {
        Some(s) if num_unpaired >= 3 => s,
        _ => {
            return Err(MeshError::OpenHull {
                visited: 0,
                expected: num_unpaired,
            })
        }
    };

    triangles.resize(num_sides + 3 * num_unpaired, 0);
    halfedges.resize(num_sides + 3 * num_unpaired, EMPTY);

    let mut s = first;
    for i in 0..num_unpaired {
        if halfedges[s] != EMPTY {
            // Walked back onto a side that is already stitched
            return Err(MeshError::OpenHull {
                visited: i,
                expected: num_unpaired,
            });
        }

        let start = triangles[s];
        let end = triangles[next_side_in_triangle(s)];

        let t = num_sides + 3 * i;
        triangles[t] = end;
        triangles[t + 1] = start;
        triangles[t + 2] = pole;

        halfedges[s] = t;
        halfedges[t] = s;

        let k = num_sides + (3 * i + 4) % (3 * num_unpaired);
        halfedges[t + 2] = k;
        halfedges[k] = t + 2;

        s = match unpaired_from[end] {
            Some(next) => next,
            None => {
                return Err(MeshError::OpenHull {
                    visited: i + 1,
                    expected: num_unpaired,
                })
            }
        };
    }

    if s != first {
        return Err(MeshError::OpenHull {
            visited: num_unpaired,
            expected: num_unpaired,
        });
    }

    Ok(num_unpaired)
}
