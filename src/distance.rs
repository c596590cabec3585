//! Multi-source distance fields over a region graph
//!
//! Dijkstra from several sources at once. The edge cost callback sees which
//! source a frontier came from, so one traversal can spread settlements,
//! cultures or moisture with per-origin rules.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use rayon::prelude::*;

use crate::graph::{RegionGraph, RegionId};

/// Cost of moving across one edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgeCost {
    /// The edge cannot be used.
    Blocked,
    /// The edge can be used at this (non-negative) cost.
    Cost(f64),
}

impl EdgeCost {
    /// The usable cost, if any. Negative and NaN costs count as blocked.
    pub fn value(self) -> Option<f64> {
        match self {
            EdgeCost::Cost(c) if c >= 0.0 => Some(c),
            _ => None,
        }
    }
}

/// Negative values (the classic "-1 means forbidden" convention) and NaN map
/// to `Blocked`.
impl From<f64> for EdgeCost {
    fn from(cost: f64) -> Self {
        if cost >= 0.0 {
            EdgeCost::Cost(cost)
        } else {
            EdgeCost::Blocked
        }
    }
}

/// Result of a traversal that also tracks which source claimed each region.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceField {
    /// Minimum cost from any source, `f64::INFINITY` if unreachable
    pub distance: Vec<f64>,
    /// Source whose frontier reached the region first, `None` if unreachable
    pub origin: Vec<Option<RegionId>>,
}

impl DistanceField {
    pub fn is_reachable(&self, r: RegionId) -> bool {
        self.distance[r].is_finite()
    }

    /// Regions claimed by `source`.
    pub fn territory(&self, source: RegionId) -> Vec<RegionId> {
        self.origin
            .iter()
            .enumerate()
            .filter(|(_, o)| **o == Some(source))
            .map(|(r, _)| r)
            .collect()
    }
}

/// Frontier entry, ordered so `BinaryHeap` pops the cheapest first.
#[derive(Debug)]
struct Frontier {
    cost: f64,
    origin: RegionId,
    region: RegionId,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.region.cmp(&self.region))
    }
}

/// Minimum traversal cost from any of `sources` to every region.
///
/// `cost(origin, from, to)` is asked once per relaxed edge. Regions in
/// `blocked` can be reached but are never expanded from. Unreachable regions
/// keep `f64::INFINITY`.
pub fn distance_field<G, F>(
    graph: &G,
    sources: &[RegionId],
    blocked: &HashSet<RegionId>,
    cost: F,
) -> Vec<f64>
where
    G: RegionGraph + ?Sized,
    F: FnMut(RegionId, RegionId, RegionId) -> EdgeCost,
{
    let scored: Vec<(RegionId, f64)> = sources.iter().map(|&s| (s, 0.0)).collect();
    distance_field_scored(graph, &scored, blocked, cost).distance
}

/// Like [`distance_field`], but every source starts at its own score and the
/// result records which source claimed each region.
///
/// Sources out of range or with a non-finite or negative score are ignored.
/// When two sources share a region the lower score wins.
pub fn distance_field_scored<G, F>(
    graph: &G,
    sources: &[(RegionId, f64)],
    blocked: &HashSet<RegionId>,
    mut cost: F,
) -> DistanceField
where
    G: RegionGraph + ?Sized,
    F: FnMut(RegionId, RegionId, RegionId) -> EdgeCost,
{
    let n = graph.num_regions();
    let mut distance = vec![f64::INFINITY; n];
    let mut origin = vec![None; n];
    let mut heap = BinaryHeap::new();

    for &(s, score) in sources {
        if s >= n || !score.is_finite() || score < 0.0 {
            continue;
        }
        if score < distance[s] {
            distance[s] = score;
            origin[s] = Some(s);
            heap.push(Frontier {
                cost: score,
                origin: s,
                region: s,
            });
        }
    }

    while let Some(Frontier {
        cost: current,
        origin: from_origin,
        region,
    }) = heap.pop()
    {
        // Stale entry: a cheaper path was found after this one was queued
        if current > distance[region] || origin[region] != Some(from_origin) {
            continue;
        }
        if blocked.contains(&region) {
            continue;
        }

        for &next in graph.neighbors(region) {
            let Some(step) = cost(from_origin, region, next).value() else {
                continue;
            };
            let candidate = current + step;
            if candidate < distance[next] {
                distance[next] = candidate;
                origin[next] = Some(from_origin);
                heap.push(Frontier {
                    cost: candidate,
                    origin: from_origin,
                    region: next,
                });
            }
        }
    }

    DistanceField { distance, origin }
}

/// Run several independent distance fields concurrently.
///
/// Each field gets its own source list; the graph, blocked set and cost
/// function are shared read-only.
pub fn distance_fields_parallel<G, F>(
    graph: &G,
    source_sets: &[Vec<RegionId>],
    blocked: &HashSet<RegionId>,
    cost: F,
) -> Vec<Vec<f64>>
where
    G: RegionGraph + Sync + ?Sized,
    F: Fn(RegionId, RegionId, RegionId) -> EdgeCost + Sync,
{
    source_sets
        .par_iter()
        .map(|sources| distance_field(graph, sources, blocked, &cost))
        .collect()
}

/// Ready-made cost functions.
pub mod costs {
    use super::EdgeCost;
    use crate::graph::{RegionGraph, RegionId};

    /// Every edge costs 1 (hop count).
    pub fn uniform(_origin: RegionId, _from: RegionId, _to: RegionId) -> EdgeCost {
        EdgeCost::Cost(1.0)
    }

    /// Edge length as reported by the graph.
    pub fn great_circle<G: RegionGraph + ?Sized>(
        graph: &G,
    ) -> impl Fn(RegionId, RegionId, RegionId) -> EdgeCost + '_ {
        move |_, from, to| EdgeCost::Cost(graph.edge_length(from, to))
    }

    /// Edge length, but never enter a region at or below sea level.
    pub fn land_only<'a, G: RegionGraph + ?Sized>(
        graph: &'a G,
        elevation: &'a [f64],
    ) -> impl Fn(RegionId, RegionId, RegionId) -> EdgeCost + 'a {
        move |_, from, to| {
            if elevation[to] <= 0.0 {
                EdgeCost::Blocked
            } else {
                EdgeCost::Cost(graph.edge_length(from, to))
            }
        }
    }

    /// Edge length scaled by how slow the destination is to travel through:
    /// `land` for land, `sea` for water. Coastal crossings use the sea rate.
    pub fn sea_penalty<'a, G: RegionGraph + ?Sized>(
        graph: &'a G,
        elevation: &'a [f64],
        land: f64,
        sea: f64,
    ) -> impl Fn(RegionId, RegionId, RegionId) -> EdgeCost + 'a {
        move |_, from, to| {
            let rate = if elevation[from] <= 0.0 || elevation[to] <= 0.0 {
                sea
            } else {
                land
            };
            EdgeCost::from(rate * graph.edge_length(from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyGraph;

    fn none() -> HashSet<RegionId> {
        HashSet::new()
    }

    #[test]
    fn test_path_graph_hop_count() {
        let g = AdjacencyGraph::path(5);
        let d = distance_field(&g, &[0], &none(), costs::uniform);
        assert_eq!(d, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_multiple_sources_take_minimum() {
        let g = AdjacencyGraph::path(7);
        let d = distance_field(&g, &[0, 6], &none(), costs::uniform);
        assert_eq!(d, vec![0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn test_blocked_edge_leaves_region_unreachable() {
        let g = AdjacencyGraph::path(4);
        let d = distance_field(&g, &[0], &none(), |_, from, to| {
            if from == 1 && to == 2 {
                EdgeCost::Blocked
            } else {
                EdgeCost::Cost(1.0)
            }
        });
        assert_eq!(d[1], 1.0);
        assert!(d[2].is_infinite());
        assert!(d[3].is_infinite());
    }

    #[test]
    fn test_negative_cost_is_blocked() {
        assert_eq!(EdgeCost::from(-1.0), EdgeCost::Blocked);
        assert_eq!(EdgeCost::from(f64::NAN), EdgeCost::Blocked);
        assert_eq!(EdgeCost::from(2.5), EdgeCost::Cost(2.5));
        assert_eq!(EdgeCost::Cost(-3.0).value(), None);

        let g = AdjacencyGraph::path(3);
        let d = distance_field(&g, &[0], &none(), |_, _, to| {
            EdgeCost::from(if to == 2 { -1.0 } else { 1.0 })
        });
        assert!(d[2].is_infinite());
    }

    #[test]
    fn test_blocked_region_is_reached_but_not_crossed() {
        let g = AdjacencyGraph::path(5);
        let blocked: HashSet<_> = [2].into_iter().collect();
        let d = distance_field(&g, &[0], &blocked, costs::uniform);
        assert_eq!(d[2], 2.0);
        assert!(d[3].is_infinite());
    }

    #[test]
    fn test_ring_goes_the_short_way() {
        let g = AdjacencyGraph::ring(6);
        let d = distance_field(&g, &[0], &none(), costs::uniform);
        assert_eq!(d, vec![0.0, 1.0, 2.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_cheaper_long_way_wins() {
        // 0-1 costs 10, 0-2-3-1 costs 3
        let g = AdjacencyGraph::from_edges(4, &[(0, 1), (0, 2), (2, 3), (3, 1)]);
        let d = distance_field(&g, &[0], &none(), |_, from, to| {
            if (from, to) == (0, 1) || (from, to) == (1, 0) {
                EdgeCost::Cost(10.0)
            } else {
                EdgeCost::Cost(1.0)
            }
        });
        assert_eq!(d[1], 3.0);
    }

    #[test]
    fn test_origin_aware_costs_and_territory() {
        let g = AdjacencyGraph::path(6);
        // Source 5 spreads three times slower than source 0
        let field = distance_field_scored(&g, &[(0, 0.0), (5, 0.0)], &none(), |origin, _, _| {
            EdgeCost::Cost(if origin == 5 { 3.0 } else { 1.0 })
        });
        assert_eq!(field.territory(0), vec![0, 1, 2, 3]);
        assert_eq!(field.territory(5), vec![4, 5]);
        assert_eq!(field.distance[4], 3.0);
        assert!(field.is_reachable(3));
    }

    #[test]
    fn test_start_scores() {
        let g = AdjacencyGraph::path(5);
        let field = distance_field_scored(&g, &[(0, 0.0), (4, 2.0)], &none(), costs::uniform);
        assert_eq!(field.distance, vec![0.0, 1.0, 2.0, 3.0, 2.0]);
        assert_eq!(field.origin[3], Some(0));
    }

    #[test]
    fn test_empty_sources() {
        let g = AdjacencyGraph::path(3);
        let d = distance_field(&g, &[], &none(), costs::uniform);
        assert!(d.iter().all(|x| x.is_infinite()));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let g = AdjacencyGraph::ring(40);
        let sets = vec![vec![0], vec![10, 30], vec![39]];
        let parallel = distance_fields_parallel(&g, &sets, &none(), costs::uniform);
        for (sources, field) in sets.iter().zip(&parallel) {
            assert_eq!(field, &distance_field(&g, sources, &none(), costs::uniform));
        }
    }

    #[test]
    fn test_land_only_cost() {
        let g = AdjacencyGraph::path(4);
        let elevation = [1.0, 1.0, -0.5, 1.0];
        let d = distance_field(&g, &[0], &none(), costs::land_only(&g, &elevation));
        assert_eq!(d[1], 1.0);
        assert!(d[2].is_infinite());
        assert!(d[3].is_infinite());
    }

    #[test]
    fn test_sea_penalty_cost() {
        let g = AdjacencyGraph::path(4);
        let elevation = [1.0, 1.0, -0.5, 1.0];
        let d = distance_field(&g, &[0], &none(), costs::sea_penalty(&g, &elevation, 1.0, 4.0));
        assert_eq!(d, vec![0.0, 1.0, 5.0, 9.0]);
    }
}
