//! Spherical Delaunay mesh
//!
//! Regions are the input points; triangles are the Delaunay triangles of
//! the sphere. Construction lives in [`builder`], the raw side arrays and
//! circulation in [`half_edge`]. `SphereMesh` adds positions, triangle
//! centroids and a flat neighbor cache so the per-region passes never walk
//! the half-edges in their inner loops.

pub mod builder;
pub mod half_edge;

use glam::DVec3;

use crate::error::MeshError;
use crate::geometry::{great_circle_distance, lat_lon_to_xyz, spherical_centroid, xyz_to_lat_lon, LatLon};
use crate::graph::{RegionGraph, RegionId, SideId, TriangleId};

pub use builder::{build_sphere_mesh, MIN_POINTS};
pub use half_edge::TriangleMesh;

/// Closed triangle mesh on the unit sphere.
#[derive(Clone, Debug)]
pub struct SphereMesh {
    topology: TriangleMesh,
    lat_lon: Vec<LatLon>,
    positions: Vec<DVec3>,
    pole: RegionId,
    /// Neighbor list of region r is `neighbor_list[neighbor_offsets[r]..neighbor_offsets[r + 1]]`
    neighbor_offsets: Vec<usize>,
    neighbor_list: Vec<RegionId>,
    triangle_centers: Vec<DVec3>,
}

impl SphereMesh {
    pub(crate) fn from_parts(
        topology: TriangleMesh,
        lat_lon: Vec<LatLon>,
        positions: Vec<DVec3>,
        pole: RegionId,
    ) -> Self {
        let num_regions = topology.num_regions();

        let mut neighbor_offsets = Vec::with_capacity(num_regions + 1);
        let mut neighbor_list = Vec::with_capacity(topology.num_sides());
        neighbor_offsets.push(0);
        for r in 0..num_regions {
            neighbor_list.extend(topology.circulate_regions(r));
            neighbor_offsets.push(neighbor_list.len());
        }

        let triangle_centers = (0..topology.num_triangles())
            .map(|t| {
                let [a, b, c] = topology.regions_of(t);
                spherical_centroid(positions[a], positions[b], positions[c])
            })
            .collect();

        Self {
            topology,
            lat_lon,
            positions,
            pole,
            neighbor_offsets,
            neighbor_list,
            triangle_centers,
        }
    }

    /// Rebuild a mesh from stored side arrays without re-triangulating.
    pub fn from_topology(
        lat_lon: Vec<LatLon>,
        triangles: Vec<RegionId>,
        halfedges: Vec<SideId>,
        pole: RegionId,
    ) -> Result<Self, MeshError> {
        if pole >= lat_lon.len() {
            return Err(MeshError::Topology(format!(
                "pole region {} out of range for {} regions",
                pole,
                lat_lon.len()
            )));
        }
        let topology = TriangleMesh::from_parts(lat_lon.len(), triangles, halfedges)?;
        let positions = lat_lon.iter().map(|&p| lat_lon_to_xyz(p)).collect();
        let mesh = Self::from_parts(topology, lat_lon, positions, pole);
        mesh.validate()?;
        Ok(mesh)
    }

    pub fn num_regions(&self) -> usize {
        self.topology.num_regions()
    }

    pub fn num_triangles(&self) -> usize {
        self.topology.num_triangles()
    }

    /// Number of directed sides (twice the number of edges).
    pub fn num_sides(&self) -> usize {
        self.topology.num_sides()
    }

    /// Number of undirected edges.
    pub fn num_edges(&self) -> usize {
        self.topology.num_sides() / 2
    }

    /// Region the projection was taken from.
    pub fn pole(&self) -> RegionId {
        self.pole
    }

    pub fn topology(&self) -> &TriangleMesh {
        &self.topology
    }

    pub fn lat_lon(&self, r: RegionId) -> LatLon {
        self.lat_lon[r]
    }

    pub fn lat_lons(&self) -> &[LatLon] {
        &self.lat_lon
    }

    pub fn position(&self, r: RegionId) -> DVec3 {
        self.positions[r]
    }

    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    /// Cached neighbors of `r`, in ring order.
    #[inline]
    pub fn neighbors(&self, r: RegionId) -> &[RegionId] {
        &self.neighbor_list[self.neighbor_offsets[r]..self.neighbor_offsets[r + 1]]
    }

    #[inline]
    pub fn degree(&self, r: RegionId) -> usize {
        self.neighbor_offsets[r + 1] - self.neighbor_offsets[r]
    }

    /// Neighbors of `r` computed from the half-edges rather than the cache.
    pub fn circulate_regions(&self, r: RegionId) -> Vec<RegionId> {
        self.topology.circulate_regions(r)
    }

    pub fn triangles_around(&self, r: RegionId) -> Vec<TriangleId> {
        self.topology.triangles_around(r)
    }

    pub fn regions_of(&self, t: TriangleId) -> [RegionId; 3] {
        self.topology.regions_of(t)
    }

    /// Centroid of triangle `t` on the unit sphere.
    pub fn triangle_center(&self, t: TriangleId) -> DVec3 {
        self.triangle_centers[t]
    }

    pub fn triangle_lat_lon(&self, t: TriangleId) -> LatLon {
        xyz_to_lat_lon(self.triangle_centers[t])
    }

    /// Great-circle distance between two regions, in radians.
    pub fn distance(&self, a: RegionId, b: RegionId) -> f64 {
        great_circle_distance(self.positions[a], self.positions[b])
    }

    /// Check the closed-sphere invariants.
    ///
    /// - every side has a mutual opposite whose start is this side's end
    /// - every region's ring closes and has at least 3 neighbors
    /// - adjacency is symmetric
    /// - the degrees add up to the number of sides
    pub fn validate(&self) -> Result<(), MeshError> {
        let topo = &self.topology;

        for s in 0..topo.num_sides() {
            let o = topo.opposite_side(s);
            if topo.opposite_side(o) != s || topo.side_begin_region(o) != topo.side_end_region(s) {
                return Err(MeshError::Topology(format!("side {} and {} do not match up", s, o)));
            }
        }

        let mut degree_sum = 0;
        for r in 0..self.num_regions() {
            if !topo.is_ring_closed(r) {
                return Err(MeshError::Topology(format!("ring around region {} is open", r)));
            }
            let ring = self.neighbors(r);
            if ring.len() < 3 {
                return Err(MeshError::Topology(format!(
                    "region {} has only {} neighbors",
                    r,
                    ring.len()
                )));
            }
            for &n in ring {
                if n == r || !self.neighbors(n).contains(&r) {
                    return Err(MeshError::Topology(format!(
                        "adjacency {} -> {} is not symmetric",
                        r, n
                    )));
                }
            }
            degree_sum += ring.len();
        }

        if degree_sum != topo.num_sides() {
            return Err(MeshError::Topology(format!(
                "degree sum {} but {} sides",
                degree_sum,
                topo.num_sides()
            )));
        }
        Ok(())
    }
}

impl RegionGraph for SphereMesh {
    fn num_regions(&self) -> usize {
        SphereMesh::num_regions(self)
    }

    fn neighbors(&self, r: RegionId) -> &[RegionId] {
        SphereMesh::neighbors(self, r)
    }

    fn edge_length(&self, a: RegionId, b: RegionId) -> f64 {
        self.distance(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::generate_points;

    fn sphere(n: usize) -> SphereMesh {
        build_sphere_mesh(generate_points(3, n, 0.5).unwrap()).unwrap()
    }

    #[test]
    fn test_neighbor_cache_matches_circulation() {
        let mesh = sphere(200);
        for r in 0..mesh.num_regions() {
            assert_eq!(mesh.neighbors(r), mesh.circulate_regions(r).as_slice());
            assert_eq!(mesh.degree(r), mesh.triangles_around(r).len());
        }
    }

    #[test]
    fn test_triangle_centers_on_sphere() {
        let mesh = sphere(100);
        for t in 0..mesh.num_triangles() {
            let c = mesh.triangle_center(t);
            assert!((c.length() - 1.0).abs() < 1e-9);
            // The centroid is closer to its own corners than to the far side
            let [a, _, _] = mesh.regions_of(t);
            assert!(great_circle_distance(c, mesh.position(a)) < 1.0);
        }
    }

    #[test]
    fn test_from_topology_rebuilds_same_graph() {
        let mesh = sphere(150);
        let rebuilt = SphereMesh::from_topology(
            mesh.lat_lons().to_vec(),
            mesh.topology().triangles().to_vec(),
            mesh.topology().halfedges().to_vec(),
            mesh.pole(),
        )
        .unwrap();
        for r in 0..mesh.num_regions() {
            assert_eq!(mesh.neighbors(r), rebuilt.neighbors(r));
        }
    }

    #[test]
    fn test_from_topology_rejects_bad_pole() {
        let mesh = sphere(50);
        let result = SphereMesh::from_topology(
            mesh.lat_lons().to_vec(),
            mesh.topology().triangles().to_vec(),
            mesh.topology().halfedges().to_vec(),
            10_000,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_edge_length_is_great_circle() {
        let mesh = sphere(80);
        let r = 10;
        for &n in mesh.neighbors(r) {
            let d = RegionGraph::edge_length(&mesh, r, n);
            assert!(d > 0.0 && d < std::f64::consts::PI);
            assert_eq!(d, mesh.distance(n, r));
        }
    }
}
