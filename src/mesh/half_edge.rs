//! Half-edge triangle mesh
//!
//! Triangles are stored as a flat array of sides: side `s` belongs to triangle
//! `s / 3` and starts at region `triangles[s]`. `halfedges[s]` is the side in
//! the neighboring triangle running the opposite way. The index arithmetic is
//! kept behind the named helpers below.

use crate::error::MeshError;
use crate::graph::{RegionId, SideId, TriangleId};

/// Triangle that owns side `s`.
#[inline]
pub fn triangle_of_side(s: SideId) -> TriangleId {
    s / 3
}

/// Next side within the same triangle (wraps 2 -> 0).
#[inline]
pub fn next_side_in_triangle(s: SideId) -> SideId {
    if s % 3 == 2 {
        s - 2
    } else {
        s + 1
    }
}

/// Previous side within the same triangle (wraps 0 -> 2).
#[inline]
pub fn prev_side_in_triangle(s: SideId) -> SideId {
    if s % 3 == 0 {
        s + 2
    } else {
        s - 1
    }
}

/// A closed triangle mesh: every side has an opposite.
#[derive(Clone, Debug, PartialEq)]
pub struct TriangleMesh {
    num_regions: usize,
    triangles: Vec<RegionId>,
    halfedges: Vec<SideId>,
    /// One side ending at each region; circulation starts here.
    r_in_s: Vec<SideId>,
}

impl TriangleMesh {
    /// Assemble a mesh from raw side arrays.
    ///
    /// Rejects arrays of mismatched length, opposites that are out of range or
    /// not mutual, and regions that no side touches.
    pub fn from_parts(
        num_regions: usize,
        triangles: Vec<RegionId>,
        halfedges: Vec<SideId>,
    ) -> Result<Self, MeshError> {
        let num_sides = triangles.len();
        if num_sides % 3 != 0 || halfedges.len() != num_sides {
            return Err(MeshError::Topology(format!(
                "{} triangle entries and {} half-edges",
                num_sides,
                halfedges.len()
            )));
        }

        for s in 0..num_sides {
            let opposite = halfedges[s];
            if opposite >= num_sides {
                return Err(MeshError::Topology(format!("side {} has no opposite", s)));
            }
            if halfedges[opposite] != s {
                return Err(MeshError::Topology(format!(
                    "side {} pairs with {} but {} pairs with {}",
                    s, opposite, opposite, halfedges[opposite]
                )));
            }
            if triangles[s] >= num_regions {
                return Err(MeshError::Topology(format!(
                    "side {} starts at unknown region {}",
                    s, triangles[s]
                )));
            }
        }

        let mut r_in_s = vec![usize::MAX; num_regions];
        for s in 0..num_sides {
            let end = triangles[next_side_in_triangle(s)];
            if r_in_s[end] == usize::MAX {
                r_in_s[end] = s;
            }
        }
        if let Some(r) = r_in_s.iter().position(|&s| s == usize::MAX) {
            return Err(MeshError::Topology(format!("region {} is not in any triangle", r)));
        }

        Ok(Self {
            num_regions,
            triangles,
            halfedges,
            r_in_s,
        })
    }

    pub fn num_regions(&self) -> usize {
        self.num_regions
    }

    pub fn num_sides(&self) -> usize {
        self.triangles.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Raw side -> start region array.
    pub fn triangles(&self) -> &[RegionId] {
        &self.triangles
    }

    /// Raw side -> opposite side array.
    pub fn halfedges(&self) -> &[SideId] {
        &self.halfedges
    }

    #[inline]
    pub fn side_begin_region(&self, s: SideId) -> RegionId {
        self.triangles[s]
    }

    #[inline]
    pub fn side_end_region(&self, s: SideId) -> RegionId {
        self.triangles[next_side_in_triangle(s)]
    }

    #[inline]
    pub fn opposite_side(&self, s: SideId) -> SideId {
        self.halfedges[s]
    }

    /// The three regions of triangle `t`, in side order.
    pub fn regions_of(&self, t: TriangleId) -> [RegionId; 3] {
        let s = 3 * t;
        [self.triangles[s], self.triangles[s + 1], self.triangles[s + 2]]
    }

    /// Sides arriving at `r`, in ring order.
    ///
    /// Walks incoming side -> next side (leaving `r`) -> its opposite (arriving
    /// at `r` again). The walk is capped at `num_sides` steps so a corrupted
    /// mesh cannot loop forever.
    pub fn incoming_sides(&self, r: RegionId) -> Vec<SideId> {
        let s0 = self.r_in_s[r];
        let mut sides = Vec::with_capacity(6);
        let mut incoming = s0;
        for _ in 0..self.num_sides() {
            sides.push(incoming);
            let outgoing = next_side_in_triangle(incoming);
            incoming = self.halfedges[outgoing];
            if incoming == s0 {
                break;
            }
        }
        sides
    }

    /// Neighboring regions of `r`, in ring order.
    pub fn circulate_regions(&self, r: RegionId) -> Vec<RegionId> {
        self.incoming_sides(r)
            .into_iter()
            .map(|s| self.side_begin_region(s))
            .collect()
    }

    /// Triangles around `r`, in ring order.
    pub fn triangles_around(&self, r: RegionId) -> Vec<TriangleId> {
        self.incoming_sides(r)
            .into_iter()
            .map(triangle_of_side)
            .collect()
    }

    /// Whether circulating around `r` comes back to its starting side.
    pub fn is_ring_closed(&self, r: RegionId) -> bool {
        let s0 = self.r_in_s[r];
        let mut incoming = s0;
        for _ in 0..self.num_sides() {
            incoming = self.halfedges[next_side_in_triangle(incoming)];
            if incoming == s0 {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Regular tetrahedron: 4 regions, 4 triangles, 12 sides.
    fn tetrahedron() -> TriangleMesh {
        let triangles = vec![0, 1, 2, 0, 3, 1, 0, 2, 3, 1, 3, 2];
        let mut halfedges = vec![usize::MAX; triangles.len()];
        for s in 0..triangles.len() {
            let a = triangles[s];
            let b = triangles[next_side_in_triangle(s)];
            for o in 0..triangles.len() {
                if triangles[o] == b && triangles[next_side_in_triangle(o)] == a {
                    halfedges[s] = o;
                }
            }
        }
        TriangleMesh::from_parts(4, triangles, halfedges).unwrap()
    }

    #[test]
    fn test_side_arithmetic() {
        assert_eq!(triangle_of_side(0), 0);
        assert_eq!(triangle_of_side(5), 1);
        assert_eq!(next_side_in_triangle(3), 4);
        assert_eq!(next_side_in_triangle(4), 5);
        assert_eq!(next_side_in_triangle(5), 3);
        assert_eq!(prev_side_in_triangle(3), 5);
        assert_eq!(prev_side_in_triangle(4), 3);
        for s in 0..30 {
            assert_eq!(prev_side_in_triangle(next_side_in_triangle(s)), s);
            assert_eq!(triangle_of_side(next_side_in_triangle(s)), triangle_of_side(s));
        }
    }

    #[test]
    fn test_tetrahedron_topology() {
        let mesh = tetrahedron();
        assert_eq!(mesh.num_triangles(), 4);
        for r in 0..4 {
            assert!(mesh.is_ring_closed(r));
            let mut ring = mesh.circulate_regions(r);
            ring.sort();
            let expected: Vec<_> = (0..4).filter(|&o| o != r).collect();
            assert_eq!(ring, expected);
            assert_eq!(mesh.triangles_around(r).len(), 3);
        }
        for s in 0..mesh.num_sides() {
            assert_eq!(mesh.opposite_side(mesh.opposite_side(s)), s);
            assert_eq!(mesh.side_begin_region(mesh.opposite_side(s)), mesh.side_end_region(s));
        }
    }

    #[test]
    fn test_regions_of_triangle() {
        let mesh = tetrahedron();
        assert_eq!(mesh.regions_of(1), [0, 3, 1]);
    }

    #[test]
    fn test_rejects_unpaired_side() {
        let triangles = vec![0, 1, 2];
        let halfedges = vec![usize::MAX; 3];
        assert!(matches!(
            TriangleMesh::from_parts(3, triangles, halfedges),
            Err(MeshError::Topology(_))
        ));
    }
}
