//! River and waterfall annotation on routed terrain.

use crate::graph::{RegionGraph, RegionId};
use crate::parallel::map_regions;

use super::{HydrologyParams, RegionData};

/// Surface drop to the downhill neighbor per unit edge length.
///
/// Zero for regions without a downhill neighbor and for zero-length edges.
pub fn slopes<G>(graph: &G, data: &RegionData) -> Vec<f64>
where
    G: RegionGraph + Sync + ?Sized,
{
    map_regions(graph.num_regions(), |r| match data.downhill[r] {
        Some(d) => {
            let length = graph.edge_length(r, d);
            if length > 0.0 {
                (data.surface(r) - data.surface(d)) / length
            } else {
                0.0
            }
        }
        None => 0.0,
    })
}

/// Dry land regions carrying more than `factor` times their own rainfall.
pub fn river_regions(data: &RegionData, factor: f64) -> Vec<RegionId> {
    (0..data.len())
        .filter(|&r| data.is_dry_land(r) && data.flux[r] > factor * data.rainfall[r])
        .collect()
}

/// Mark steep, wet land as waterfalls, returning how many were marked.
///
/// A region is a waterfall if its slope relative to the steepest land slope
/// exceeds `waterfall_slope` and its flux exceeds `waterfall_flux_factor`
/// times its rainfall.
///
/// Reads `downhill`, `flux`, `rainfall`; writes `waterfall`.
pub fn annotate_waterfalls<G>(graph: &G, data: &mut RegionData, params: &HydrologyParams) -> usize
where
    G: RegionGraph + Sync + ?Sized,
{
    let slope = slopes(graph, data);
    let max_slope = (0..data.len())
        .filter(|&r| data.elevation[r] > 0.0)
        .map(|r| slope[r])
        .fold(0.0f64, f64::max);

    let mut count = 0;
    for r in 0..data.len() {
        let is_waterfall = max_slope > 0.0
            && data.is_dry_land(r)
            && slope[r] / max_slope > params.waterfall_slope
            && data.flux[r] > params.waterfall_flux_factor * data.rainfall[r];
        data.waterfall[r] = is_waterfall;
        if is_waterfall {
            count += 1;
        }
    }
    count
}
