//! Hydrology: downhill routing, sink filling, flux, erosion, lakes and rivers
//!
//! Every pass works on a [`RegionData`] over any [`RegionGraph`]. The surface
//! of a region is `elevation + waterpool`; water leaves a region through
//! `drainage` if it sits in a draining lake, otherwise through `downhill`.
//!
//! [`assign_hydrology`] runs the passes in order:
//! 1. downhill + flux on the raw terrain
//! 2. flood closed basins into lakes (optional)
//! 3. `attempts` rounds of fill -> downhill -> flux -> erode
//! 4. a final fill -> downhill -> flux in which lakes without a way out are
//!    raised to their spill level, so every land region reaches the sea
//! 5. river and waterfall annotation

pub mod basins;
pub mod flow;
pub mod lakes;
pub mod params;
pub mod rivers;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::graph::{RegionGraph, RegionId};

pub use basins::{basin_rainfall, drainage_basins};
pub use flow::{
    accumulate_flux, assign_downhill, erode, fill_sinks, fill_sinks_and_drain_lakes, find_sinks, FillOutcome,
};
pub use lakes::{collect_lakes, flood_lake, flood_lakes, lake_stats, Lake, LakeOutcome, LakeScratch, LakeStats};
pub use params::{HydrologyParams, HydrologyPreset};
pub use rivers::{annotate_waterfalls, river_regions, slopes};

/// Per-region hydrology arrays. All vectors have the same length.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionData {
    /// Height above sea level; `<= 0` is ocean
    pub elevation: Vec<f64>,
    /// Steepest-descent neighbor, `None` for sinks and skipped ocean
    pub downhill: Vec<Option<RegionId>>,
    /// Where a draining lake's water leaves, `None` outside draining lakes
    pub drainage: Vec<Option<RegionId>>,
    /// Standing water depth above `elevation`
    pub waterpool: Vec<f64>,
    /// Water passing through the region
    pub flux: Vec<f64>,
    /// Water falling on the region
    pub rainfall: Vec<f64>,
    /// Moisture left by climate passes; carried, not produced here
    pub moisture: Vec<f64>,
    pub waterfall: Vec<bool>,
}

impl RegionData {
    /// Flat, dry, rainless regions.
    pub fn new(num_regions: usize) -> Self {
        Self {
            elevation: vec![0.0; num_regions],
            downhill: vec![None; num_regions],
            drainage: vec![None; num_regions],
            waterpool: vec![0.0; num_regions],
            flux: vec![0.0; num_regions],
            rainfall: vec![0.0; num_regions],
            moisture: vec![0.0; num_regions],
            waterfall: vec![false; num_regions],
        }
    }

    /// Regions with the given elevation and one unit of rain each.
    pub fn with_elevation(elevation: Vec<f64>) -> Self {
        let n = elevation.len();
        Self {
            elevation,
            rainfall: vec![1.0; n],
            ..Self::new(n)
        }
    }

    pub fn len(&self) -> usize {
        self.elevation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elevation.is_empty()
    }

    /// Whether every array has the same length.
    pub fn is_consistent(&self) -> bool {
        let n = self.elevation.len();
        self.downhill.len() == n
            && self.drainage.len() == n
            && self.waterpool.len() == n
            && self.flux.len() == n
            && self.rainfall.len() == n
            && self.moisture.len() == n
            && self.waterfall.len() == n
    }

    /// Water surface height.
    #[inline]
    pub fn surface(&self, r: RegionId) -> f64 {
        self.elevation[r] + self.waterpool[r]
    }

    /// Where water leaving `r` goes.
    #[inline]
    pub fn receiver(&self, r: RegionId) -> Option<RegionId> {
        self.drainage[r].or(self.downhill[r])
    }

    #[inline]
    pub fn is_ocean(&self, r: RegionId) -> bool {
        self.elevation[r] <= 0.0
    }

    #[inline]
    pub fn is_lake(&self, r: RegionId) -> bool {
        self.waterpool[r] > 0.0
    }

    /// Land that is not under a lake.
    #[inline]
    pub fn is_dry_land(&self, r: RegionId) -> bool {
        self.elevation[r] > 0.0 && self.waterpool[r] <= 0.0
    }
}

/// Summary of a hydrology run.
#[derive(Clone, Debug, Default)]
pub struct HydrologyReport {
    /// Erosion rounds run
    pub attempts: usize,
    /// Regions raised by sink filling, over all rounds
    pub regions_raised: usize,
    /// Total elevation removed by erosion
    pub eroded: f64,
    /// Lakes after the final pass
    pub lakes: Vec<Lake>,
    /// Lake regions that stopped draining because their outlet ended up
    /// above them
    pub lakes_closed_by_outlet: usize,
    /// Lakes raised to their spill level by the final pass
    pub lakes_drained: usize,
    pub waterfalls: usize,
    pub rivers: usize,
    /// Land regions left without a receiver after the final pass (only the
    /// lowest region of each part of the graph without ocean)
    pub sinks_remaining: usize,
    /// Regions whose water could not be routed because of a receiver cycle
    pub cycles_skipped: usize,
}

impl HydrologyReport {
    pub fn lake_stats(&self) -> LakeStats {
        lake_stats(&self.lakes)
    }
}

/// Run the full hydrology pipeline.
///
/// Reads `elevation` and `rainfall`; writes `elevation` (filling and
/// erosion), `downhill`, `drainage`, `waterpool`, `flux` and `waterfall`.
pub fn assign_hydrology<G>(graph: &G, data: &mut RegionData, params: &HydrologyParams) -> HydrologyReport
where
    G: RegionGraph + Sync + ?Sized,
{
    let mut report = HydrologyReport::default();

    assign_downhill(graph, data, params.skip_below_sea);
    accumulate_flux(data);

    if params.lakes {
        let lakes = flood_lakes(graph, data, params);
        debug!("Flooded {} lakes on raw terrain", lakes.len());
    }

    for attempt in 0..params.attempts {
        let routed = route(graph, data, params, false);
        let removed = erode(graph, data, params.erosion_coefficient);
        debug!(
            "Hydrology attempt {}: raised {} regions, eroded {:.4}",
            attempt + 1,
            routed.raised,
            removed
        );
        report.attempts += 1;
        report.regions_raised += routed.raised;
        report.lakes_closed_by_outlet += routed.closed;
        report.eroded += removed;
    }

    let routed = route(graph, data, params, true);
    report.regions_raised += routed.raised;
    report.lakes_closed_by_outlet += routed.closed;
    report.lakes_drained = routed.drained;
    report.cycles_skipped = routed.cycles;

    report.lakes = collect_lakes(graph, data);
    report.waterfalls = annotate_waterfalls(graph, data, params);
    report.rivers = river_regions(data, params.river_flux_factor).len();
    report.sinks_remaining = find_sinks(data).len();

    let stats = report.lake_stats();
    info!(
        "Hydrology: {} regions raised, {} lakes ({} closed), {} rivers, {} waterfalls",
        report.regions_raised, stats.count, stats.closed, report.rivers, report.waterfalls
    );

    report
}

struct Routed {
    raised: usize,
    closed: usize,
    drained: usize,
    cycles: usize,
}

/// Bound on fill/settle rounds when lakes are drained; each round normally
/// only handles lakes whose outlet sat in a pit behind them.
const MAX_SETTLE_ROUNDS: usize = 16;

/// Fill sinks, close lakes cut off by the fill, then route water.
///
/// With `drain_lakes`, lakes without a way out are raised until they spill
/// instead of being left as terminals.
fn route<G>(graph: &G, data: &mut RegionData, params: &HydrologyParams, drain_lakes: bool) -> Routed
where
    G: RegionGraph + Sync + ?Sized,
{
    let fill = |data: &mut RegionData| {
        if drain_lakes {
            fill_sinks_and_drain_lakes(graph, data, params.fill_epsilon)
        } else {
            FillOutcome {
                raised: fill_sinks(graph, data, params.fill_epsilon),
                lakes_drained: 0,
            }
        }
    };

    let mut filled = fill(&mut *data);
    let mut raised = filled.raised;
    let mut drained = filled.lakes_drained;
    let mut closed = 0;
    // Without draining this terminates: every round removes a drainage pointer
    let mut rounds = 0;
    loop {
        let newly_closed = lakes::settle_lake_outlets(data);
        if newly_closed == 0 {
            break;
        }
        if drain_lakes && rounds == MAX_SETTLE_ROUNDS {
            warn!("{} lake regions still cut off after {} rounds", newly_closed, rounds);
            break;
        }
        rounds += 1;
        closed += newly_closed;
        filled = fill(&mut *data);
        raised += filled.raised;
        drained += filled.lakes_drained;
    }
    assign_downhill(graph, data, params.skip_below_sea);
    let cycles = accumulate_flux(data);
    Routed {
        raised,
        closed,
        drained,
        cycles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyGraph;

    /// A 1D valley: ocean at both ends, a basin in the middle.
    fn valley() -> (AdjacencyGraph, RegionData) {
        let elevation = vec![-1.0, 2.0, 4.0, 1.0, 0.5, 1.5, 3.0, 2.0, -1.0];
        (AdjacencyGraph::path(elevation.len()), RegionData::with_elevation(elevation))
    }

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_region_data_shape() {
        let data = RegionData::with_elevation(vec![1.0, -1.0, 0.0]);
        assert_eq!(data.len(), 3);
        assert!(data.is_consistent());
        assert!(data.is_dry_land(0));
        assert!(data.is_ocean(1));
        assert!(data.is_ocean(2));
        assert_eq!(data.rainfall, vec![1.0; 3]);
    }

    #[test]
    fn test_no_sinks_after_hydrology() {
        init_logger();
        let (graph, mut data) = valley();
        let report = assign_hydrology(&graph, &mut data, &HydrologyParams::default());
        assert_eq!(report.sinks_remaining, 0);
        assert_eq!(report.attempts, 3);
        assert!(data.is_consistent());
        assert!(data.waterpool.iter().all(|&w| w >= 0.0));
    }

    #[test]
    fn test_routing_only_without_lakes_fills_basin() {
        init_logger();
        let (graph, mut data) = valley();
        let report = assign_hydrology(&graph, &mut data, &HydrologyParams::routing_only());
        assert!(report.lakes.is_empty());
        assert!(report.regions_raised > 0);
        assert!(find_sinks(&data).is_empty());
        // Every land region reaches the sea
        let basins = drainage_basins(&data);
        for r in 1..8 {
            let terminal = basins[r].unwrap();
            assert!(terminal == 0 || terminal == 8);
        }
    }

    #[test]
    fn test_drainage_never_points_uphill() {
        init_logger();
        let (graph, mut data) = valley();
        let params = HydrologyParams {
            lake_inflow_factor: 1.0,
            ..Default::default()
        };
        assign_hydrology(&graph, &mut data, &params);
        for r in 0..data.len() {
            if let Some(d) = data.drainage[r] {
                assert!(data.surface(d) <= data.surface(r));
            }
        }
    }

    #[test]
    fn test_closed_lake_drains_after_hydrology() {
        init_logger();
        // A deep basin that a small inflow cannot fill to its rim
        let elevation = vec![-1.0, 3.0, 0.5, 0.4, 0.6, 4.0, -1.0];
        let graph = AdjacencyGraph::path(elevation.len());
        let mut data = RegionData::with_elevation(elevation);
        let params = HydrologyParams {
            attempts: 0,
            lake_inflow_factor: 0.1,
            ..Default::default()
        };
        let report = assign_hydrology(&graph, &mut data, &params);

        assert!(report.lakes_drained > 0);
        assert_eq!(report.sinks_remaining, 0);
        assert!(report.lakes.iter().all(|l| !l.is_closed()));
        let basins = drainage_basins(&data);
        for r in 1..6 {
            let terminal = basins[r].unwrap();
            assert!(data.is_ocean(terminal), "region {} ends at {}", r, terminal);
            if let Some(d) = data.drainage[r] {
                assert!(data.surface(d) < data.surface(r));
            }
        }
    }

    #[test]
    fn test_flux_is_conserved_per_basin() {
        init_logger();
        let (graph, mut data) = valley();
        let report = assign_hydrology(&graph, &mut data, &HydrologyParams::default());
        assert_eq!(report.cycles_skipped, 0);
        let basins = drainage_basins(&data);
        let totals = basin_rainfall(&data, &basins);
        for (&terminal, &rain) in &totals {
            assert!(data.is_ocean(terminal));
            assert!((data.flux[terminal] - rain).abs() < 1e-9);
        }
        let all: f64 = totals.values().sum();
        assert!((all - data.rainfall.iter().sum::<f64>()).abs() < 1e-9);
    }
}
