//! Region adjacency seam
//!
//! Distance fields and hydrology only need to know how many regions exist,
//! who neighbors whom, and how far apart two neighbors are. `RegionGraph`
//! captures that so the same passes run on the sphere mesh and on small
//! hand-built graphs.

/// Index of a region (one Voronoi-like cell of the mesh).
pub type RegionId = usize;
/// Index of a triangle of the Delaunay mesh.
pub type TriangleId = usize;
/// Index of a directed half-edge ("side").
pub type SideId = usize;

/// Read-only adjacency over regions.
pub trait RegionGraph {
    /// Number of regions in the graph.
    fn num_regions(&self) -> usize;

    /// Neighbors of `r`.
    fn neighbors(&self, r: RegionId) -> &[RegionId];

    /// Length of the edge between two neighboring regions. Unit by default.
    fn edge_length(&self, _a: RegionId, _b: RegionId) -> f64 {
        1.0
    }
}

/// Explicit adjacency lists with unit edge lengths.
#[derive(Clone, Debug, Default)]
pub struct AdjacencyGraph {
    neighbors: Vec<Vec<RegionId>>,
}

impl AdjacencyGraph {
    pub fn new(neighbors: Vec<Vec<RegionId>>) -> Self {
        Self { neighbors }
    }

    /// Build an undirected graph from an edge list. Out-of-range endpoints are
    /// ignored.
    pub fn from_edges(num_regions: usize, edges: &[(RegionId, RegionId)]) -> Self {
        let mut neighbors = vec![Vec::new(); num_regions];
        for &(a, b) in edges {
            if a >= num_regions || b >= num_regions || a == b {
                continue;
            }
            if !neighbors[a].contains(&b) {
                neighbors[a].push(b);
            }
            if !neighbors[b].contains(&a) {
                neighbors[b].push(a);
            }
        }
        Self { neighbors }
    }

    /// A path 0 - 1 - ... - (n-1).
    pub fn path(num_regions: usize) -> Self {
        let edges: Vec<_> = (1..num_regions).map(|i| (i - 1, i)).collect();
        Self::from_edges(num_regions, &edges)
    }

    /// A ring 0 - 1 - ... - (n-1) - 0.
    pub fn ring(num_regions: usize) -> Self {
        let mut edges: Vec<_> = (1..num_regions).map(|i| (i - 1, i)).collect();
        if num_regions > 2 {
            edges.push((num_regions - 1, 0));
        }
        Self::from_edges(num_regions, &edges)
    }
}

impl RegionGraph for AdjacencyGraph {
    fn num_regions(&self) -> usize {
        self.neighbors.len()
    }

    fn neighbors(&self, r: RegionId) -> &[RegionId] {
        &self.neighbors[r]
    }
}
