//! Lake flood-fill
//!
//! A lake grows from a sink by absorbing its lowest boundary region. Rising
//! the water from `level` to a boundary at height `h` costs
//! `(h - level) * members` of the inflow volume. The lake stops when:
//! - a boundary region lies below the level (the lake spills there and all
//!   members drain into it),
//! - the volume runs out (the lake closes at the level it can afford),
//! - the raise budget runs out or the basin is exhausted (the lake closes).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use log::{debug, warn};

use crate::graph::{RegionGraph, RegionId};

use super::flow::find_sinks;
use super::{HydrologyParams, RegionData};

/// A body of standing water.
#[derive(Clone, Debug, PartialEq)]
pub struct Lake {
    pub id: usize,
    pub regions: Vec<RegionId>,
    /// Water surface height
    pub level: f64,
    /// Region the lake spills into, `None` for a closed lake
    pub outlet: Option<RegionId>,
    /// Sum of water depth over the member regions
    pub volume: f64,
}

impl Lake {
    pub fn is_closed(&self) -> bool {
        self.outlet.is_none()
    }

    pub fn size(&self) -> usize {
        self.regions.len()
    }
}

/// Aggregate lake statistics
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LakeStats {
    pub count: usize,
    pub closed: usize,
    pub largest: usize,
    pub mean_size: f64,
    pub total_volume: f64,
}

pub fn lake_stats(lakes: &[Lake]) -> LakeStats {
    if lakes.is_empty() {
        return LakeStats::default();
    }
    let total_regions: usize = lakes.iter().map(Lake::size).sum();
    LakeStats {
        count: lakes.len(),
        closed: lakes.iter().filter(|l| l.is_closed()).count(),
        largest: lakes.iter().map(Lake::size).max().unwrap_or(0),
        mean_size: total_regions as f64 / lakes.len() as f64,
        total_volume: lakes.iter().map(|l| l.volume).sum(),
    }
}

/// Result of flooding a single sink.
#[derive(Clone, Debug, PartialEq)]
pub struct LakeOutcome {
    pub regions: Vec<RegionId>,
    pub level: f64,
    pub outlet: Option<RegionId>,
    /// Inflow volume not used to raise the lake
    pub leftover: f64,
    /// Boundary regions absorbed
    pub raises: usize,
}

/// Visitation marks reused across flood-fills.
///
/// Marks are generation stamps, so starting a new fill is O(1) instead of
/// clearing a region-sized buffer.
#[derive(Clone, Debug, Default)]
pub struct LakeScratch {
    stamp: Vec<u32>,
    generation: u32,
}

impl LakeScratch {
    pub fn new(num_regions: usize) -> Self {
        Self {
            stamp: vec![0; num_regions],
            generation: 0,
        }
    }

    fn begin(&mut self, num_regions: usize) {
        if self.stamp.len() != num_regions || self.generation == u32::MAX {
            self.stamp.clear();
            self.stamp.resize(num_regions, 0);
            self.generation = 0;
        }
        self.generation += 1;
    }

    /// Mark `r`, returning false if it was already marked in this fill.
    fn visit(&mut self, r: RegionId) -> bool {
        if self.stamp[r] == self.generation {
            return false;
        }
        self.stamp[r] = self.generation;
        true
    }
}

/// Boundary entry, ordered so `BinaryHeap` pops the lowest surface first.
#[derive(Debug)]
struct Shore {
    surface: f64,
    region: RegionId,
}

impl PartialEq for Shore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Shore {}

impl PartialOrd for Shore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Shore {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .surface
            .total_cmp(&self.surface)
            .then_with(|| other.region.cmp(&self.region))
    }
}

/// Flood the basin around `sink` with `volume` units of water.
///
/// Only decides the lake; [`apply_lake`] writes it into the region arrays.
pub fn flood_lake<G>(
    graph: &G,
    data: &RegionData,
    sink: RegionId,
    volume: f64,
    max_raises: usize,
    scratch: &mut LakeScratch,
) -> LakeOutcome
where
    G: RegionGraph + ?Sized,
{
    scratch.begin(graph.num_regions());

    let mut level = data.surface(sink);
    let mut remaining = if volume.is_finite() { volume.max(0.0) } else { 0.0 };
    let mut regions = vec![sink];
    let mut outlet = None;
    let mut raises = 0;

    let mut shore = BinaryHeap::new();
    scratch.visit(sink);
    for &n in graph.neighbors(sink) {
        if scratch.visit(n) {
            shore.push(Shore {
                surface: data.surface(n),
                region: n,
            });
        }
    }

    loop {
        let Some(Shore { surface, region }) = shore.pop() else {
            // Nothing left to absorb: the whole component is under water
            level += remaining / regions.len() as f64;
            remaining = 0.0;
            break;
        };

        if surface < level {
            outlet = Some(region);
            break;
        }

        let cost = (surface - level) * regions.len() as f64;
        if cost > remaining {
            level += remaining / regions.len() as f64;
            remaining = 0.0;
            break;
        }

        if raises >= max_raises {
            warn!(
                "Lake at region {} hit the raise limit ({}) with {} regions",
                sink,
                max_raises,
                regions.len()
            );
            break;
        }

        remaining -= cost;
        level = surface;
        regions.push(region);
        raises += 1;

        for &n in graph.neighbors(region) {
            if scratch.visit(n) {
                shore.push(Shore {
                    surface: data.surface(n),
                    region: n,
                });
            }
        }
    }

    LakeOutcome {
        regions,
        level,
        outlet,
        leftover: remaining,
        raises,
    }
}

/// Write a flooded lake into the region arrays.
///
/// Writes `waterpool` and `drainage` of every member. A member sitting
/// exactly at the final level stays dry and gets no drainage.
pub fn apply_lake(data: &mut RegionData, outcome: &LakeOutcome) {
    for &r in &outcome.regions {
        let depth = (outcome.level - data.elevation[r]).max(0.0);
        data.waterpool[r] = depth;
        data.drainage[r] = if depth > 0.0 { outcome.outlet } else { None };
    }
}

/// Flood every dry sink into a lake.
///
/// Sinks are handled from the highest to the lowest. A sink already under an
/// earlier lake is skipped. A draining lake passes the inflow it did not use
/// on to the sink its outlet runs into, if that sink has not been flooded yet.
///
/// Reads `flux`, `downhill`; writes `waterpool`, `drainage`.
pub fn flood_lakes<G>(graph: &G, data: &mut RegionData, params: &HydrologyParams) -> Vec<Lake>
where
    G: RegionGraph + ?Sized,
{
    let n = graph.num_regions();
    let mut sinks = find_sinks(data);
    sinks.sort_by(|&a, &b| data.surface(b).total_cmp(&data.surface(a)).then(a.cmp(&b)));

    let mut pending = vec![false; n];
    for &s in &sinks {
        pending[s] = true;
    }
    let mut forwarded = vec![0.0; n];
    let mut scratch = LakeScratch::new(n);

    for &sink in &sinks {
        pending[sink] = false;
        if data.is_lake(sink) {
            continue;
        }

        let volume = data.flux[sink] * params.lake_inflow_factor + forwarded[sink];
        let outcome = flood_lake(graph, data, sink, volume, params.lake_max_raises, &mut scratch);
        apply_lake(data, &outcome);

        if let Some(outlet) = outcome.outlet {
            if outcome.leftover > 0.0 {
                if let Some(terminal) = terminal_of(data, outlet) {
                    if pending[terminal] {
                        forwarded[terminal] += outcome.leftover;
                    }
                }
            }
        }
    }

    let lakes = collect_lakes(graph, data);
    debug!("Flooded {} sinks into {} lakes", sinks.len(), lakes.len());
    lakes
}

/// End of the receiver chain starting at `r`, `None` on a cycle.
fn terminal_of(data: &RegionData, r: RegionId) -> Option<RegionId> {
    let mut current = r;
    for _ in 0..data.len() {
        match data.receiver(current) {
            Some(next) => current = next,
            None => return Some(current),
        }
    }
    None
}

/// Close every lake whose outlet now lies above its surface, returning the
/// number of regions changed.
///
/// Sink filling may raise an outlet that was reachable only through its own
/// lake; the lake then keeps its water and stops draining.
pub fn settle_lake_outlets(data: &mut RegionData) -> usize {
    let mut closed = 0;
    for r in 0..data.len() {
        if let Some(d) = data.drainage[r] {
            if data.surface(d) > data.surface(r) {
                data.drainage[r] = None;
                closed += 1;
            }
        }
    }
    closed
}

/// Group flooded regions into lakes: connected wet regions that share an
/// outlet.
pub fn collect_lakes<G>(graph: &G, data: &RegionData) -> Vec<Lake>
where
    G: RegionGraph + ?Sized,
{
    let n = graph.num_regions();
    let mut assigned = vec![false; n];
    let mut lakes = Vec::new();

    for start in 0..n {
        if assigned[start] || !data.is_lake(start) {
            continue;
        }

        let outlet = data.drainage[start];
        let mut regions = Vec::new();
        let mut queue = VecDeque::new();
        assigned[start] = true;
        queue.push_back(start);

        while let Some(r) = queue.pop_front() {
            regions.push(r);
            for &nb in graph.neighbors(r) {
                if !assigned[nb] && data.is_lake(nb) && data.drainage[nb] == outlet {
                    assigned[nb] = true;
                    queue.push_back(nb);
                }
            }
        }

        let level = regions
            .iter()
            .map(|&r| data.surface(r))
            .fold(f64::MIN, f64::max);
        let volume = regions.iter().map(|&r| data.waterpool[r]).sum();

        lakes.push(Lake {
            id: lakes.len(),
            regions,
            level,
            outlet,
            volume,
        });
    }

    lakes
}
