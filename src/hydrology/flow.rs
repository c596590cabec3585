//! Downhill routing, sink filling, flux accumulation and erosion.
//!
//! Sink filling is a priority flood: start from the ocean and grow inward in
//! order of ascending water level. A region reached at a level it cannot
//! drain below is raised just above that level, so afterwards every dry land
//! region has a strictly lower neighbor on a path to the sea.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use log::{debug, warn};

use crate::graph::{RegionGraph, RegionId};
use crate::parallel::{map_regions, scan_regions};

use super::RegionData;

/// Eroded land never drops below this height.
const MIN_LAND_ELEVATION: f64 = 1e-6;

/// Point every region at its lowest neighbor, if that neighbor is strictly
/// lower. Regions at or below sea level get `None` when `skip_below_sea` is
/// set.
///
/// Reads `elevation`, `waterpool`; writes `downhill`.
pub fn assign_downhill<G>(graph: &G, data: &mut RegionData, skip_below_sea: bool)
where
    G: RegionGraph + Sync + ?Sized,
{
    let snapshot = &*data;
    let downhill = map_regions(graph.num_regions(), |r| {
        if skip_below_sea && snapshot.is_ocean(r) {
            return None;
        }
        lowest_neighbor(graph, snapshot, r).filter(|&n| snapshot.surface(n) < snapshot.surface(r))
    });
    data.downhill = downhill;
}

/// Neighbor with the lowest surface; ties go to the first in ring order.
fn lowest_neighbor<G>(graph: &G, data: &RegionData, r: RegionId) -> Option<RegionId>
where
    G: RegionGraph + ?Sized,
{
    let mut best: Option<RegionId> = None;
    for &n in graph.neighbors(r) {
        match best {
            Some(b) if data.surface(n) >= data.surface(b) => {}
            _ => best = Some(n),
        }
    }
    best
}

/// Land regions with nowhere to send their water, lake regions included.
pub fn find_sinks(data: &RegionData) -> Vec<RegionId> {
    (0..data.len())
        .filter(|&r| data.receiver(r).is_none() && data.elevation[r] > 0.0)
        .collect()
}

/// Flood entry, ordered so `BinaryHeap` pops the lowest level first.
#[derive(Debug)]
struct FloodCell {
    level: f64,
    region: RegionId,
}

impl PartialEq for FloodCell {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FloodCell {}

impl PartialOrd for FloodCell {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloodCell {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .level
            .total_cmp(&self.level)
            .then_with(|| other.region.cmp(&self.region))
    }
}

/// Raise every closed depression until it spills, returning the number of
/// regions raised.
///
/// Seeds are all ocean regions. Without ocean the lowest region is used, and
/// the lowest region of every part of the graph the flood cannot reach seeds
/// that part. Lake regions (`waterpool > 0`) are never raised; the flood passes
/// over them at `max(surface, level)`.
///
/// Reads `waterpool`; writes `elevation`.
pub fn fill_sinks<G>(graph: &G, data: &mut RegionData, epsilon: f64) -> usize
where
    G: RegionGraph + ?Sized,
{
    priority_flood(graph, data, epsilon, false).raised
}

/// Outcome of [`fill_sinks_and_drain_lakes`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillOutcome {
    /// Dry regions raised
    pub raised: usize,
    /// Lakes raised to their spill level and pointed at it
    pub lakes_drained: usize,
}

/// Like [`fill_sinks`], but lakes are no longer obstacles: a lake the flood
/// reaches without a way out is raised to the level the flood arrived at and
/// all its members drain into the region the flood came from.
///
/// A closed lake sitting above the flood level keeps its water and only gets
/// the drainage pointer. A draining lake is left alone unless the flood
/// arrives at or above its surface.
///
/// Afterwards every land region has a receiver, except the seeds of parts of
/// the graph without ocean.
///
/// Reads `waterpool`, `drainage`; writes `elevation`, `waterpool`, `drainage`.
pub fn fill_sinks_and_drain_lakes<G>(graph: &G, data: &mut RegionData, epsilon: f64) -> FillOutcome
where
    G: RegionGraph + ?Sized,
{
    priority_flood(graph, data, epsilon, true)
}

fn priority_flood<G>(graph: &G, data: &mut RegionData, epsilon: f64, drain_lakes: bool) -> FillOutcome
where
    G: RegionGraph + ?Sized,
{
    let n = graph.num_regions();
    let mut visited = vec![false; n];
    let mut heap = BinaryHeap::new();
    let mut outcome = FillOutcome::default();

    for r in 0..n {
        if data.is_ocean(r) {
            visited[r] = true;
            heap.push(FloodCell {
                level: data.surface(r),
                region: r,
            });
        }
    }

    // Unvisited regions keep their surface until the flood reaches them, so
    // one sort is enough to find each next component seed.
    let mut by_surface: Option<Vec<RegionId>> = None;
    let mut cursor = 0;
    let mut components = 0;
    loop {
        if heap.is_empty() {
            let order = by_surface.get_or_insert_with(|| {
                let mut order: Vec<RegionId> = (0..n).filter(|&r| !visited[r]).collect();
                order.sort_by(|&a, &b| data.surface(a).total_cmp(&data.surface(b)).then(a.cmp(&b)));
                order
            });
            while cursor < order.len() && visited[order[cursor]] {
                cursor += 1;
            }
            let Some(&r) = order.get(cursor) else { break };
            components += 1;
            visited[r] = true;
            heap.push(FloodCell {
                level: data.surface(r),
                region: r,
            });
        }

        while let Some(FloodCell { level, region }) = heap.pop() {
            for &nb in graph.neighbors(region) {
                if visited[nb] {
                    continue;
                }

                let surface = data.surface(nb);
                if data.is_lake(nb) {
                    let trapped = data.drainage[nb].is_none() || surface <= level;
                    if drain_lakes && trapped {
                        drain_lake(graph, data, nb, region, level + epsilon, &mut visited, &mut heap);
                        outcome.lakes_drained += 1;
                    } else {
                        visited[nb] = true;
                        heap.push(FloodCell {
                            level: surface.max(level),
                            region: nb,
                        });
                    }
                } else if surface <= level {
                    visited[nb] = true;
                    data.elevation[nb] = level + epsilon;
                    outcome.raised += 1;
                    heap.push(FloodCell {
                        level: level + epsilon,
                        region: nb,
                    });
                } else {
                    visited[nb] = true;
                    heap.push(FloodCell { level: surface, region: nb });
                }
            }
        }
    }

    if components > 0 {
        debug!("Sink fill seeded {} basin(s) without ocean access", components);
    }
    outcome
}

/// Raise the lake containing `entry` to at least `min_level` and point every
/// member at `spill`.
fn drain_lake<G>(
    graph: &G,
    data: &mut RegionData,
    entry: RegionId,
    spill: RegionId,
    min_level: f64,
    visited: &mut [bool],
    heap: &mut BinaryHeap<FloodCell>,
) where
    G: RegionGraph + ?Sized,
{
    let outlet = data.drainage[entry];
    let mut members = vec![entry];
    visited[entry] = true;
    let mut i = 0;
    while i < members.len() {
        let r = members[i];
        i += 1;
        for &nb in graph.neighbors(r) {
            if !visited[nb] && data.is_lake(nb) && data.drainage[nb] == outlet {
                visited[nb] = true;
                members.push(nb);
            }
        }
    }

    let level = members
        .iter()
        .map(|&r| data.surface(r))
        .fold(min_level, f64::max);
    for &r in &members {
        data.waterpool[r] = level - data.elevation[r];
        data.drainage[r] = Some(spill);
        heap.push(FloodCell { level, region: r });
    }
}

/// Accumulate rainfall downstream along the receivers, returning the number
/// of regions skipped because they sit on a receiver cycle.
///
/// Regions are processed in topological order of the receiver graph (every
/// region before the region it drains into), which is the same as descending
/// surface order when receivers never go uphill.
///
/// Reads `rainfall`, `downhill`, `drainage`; writes `flux`.
pub fn accumulate_flux(data: &mut RegionData) -> usize {
    let n = data.len();
    let mut flux = data.rainfall.clone();

    let mut pending_inputs = vec![0u32; n];
    for r in 0..n {
        if let Some(d) = data.receiver(r) {
            pending_inputs[d] += 1;
        }
    }

    let mut queue: VecDeque<RegionId> = (0..n).filter(|&r| pending_inputs[r] == 0).collect();
    let mut processed = 0;
    while let Some(r) = queue.pop_front() {
        processed += 1;
        if let Some(d) = data.receiver(r) {
            flux[d] += flux[r];
            pending_inputs[d] -= 1;
            if pending_inputs[d] == 0 {
                queue.push_back(d);
            }
        }
    }

    let skipped = n - processed;
    if skipped > 0 {
        warn!("{} regions sit on a receiver cycle; their flux is not routed", skipped);
    }

    data.flux = flux;
    skipped
}

/// Cut dry land toward its downhill neighbor in proportion to flux, returning
/// the total elevation removed.
///
/// Each region loses `coefficient * drop * flux / max_flux`, where `drop` is the
/// height difference to its downhill neighbor. Land never erodes to sea level.
///
/// Reads `downhill`, `flux`, `waterpool`; writes `elevation`.
pub fn erode<G>(graph: &G, data: &mut RegionData, coefficient: f64) -> f64
where
    G: RegionGraph + Sync + ?Sized,
{
    let coefficient = coefficient.clamp(0.0, 1.0);
    if coefficient == 0.0 || data.is_empty() {
        return 0.0;
    }

    let max_flux = (0..data.len())
        .filter(|&r| data.is_dry_land(r) && data.downhill[r].is_some())
        .map(|r| data.flux[r])
        .fold(0.0f64, f64::max);
    if max_flux <= 0.0 {
        return 0.0;
    }

    let snapshot = &*data;
    let mut elevation = vec![0.0; graph.num_regions()];
    scan_regions(&mut elevation, |r| {
        let current = snapshot.elevation[r];
        let Some(d) = snapshot.downhill[r] else {
            return current;
        };
        if !snapshot.is_dry_land(r) {
            return current;
        }
        let drop = (snapshot.surface(r) - snapshot.surface(d)).max(0.0);
        let amount = coefficient * drop * snapshot.flux[r] / max_flux;
        (current - amount).max(current.min(MIN_LAND_ELEVATION))
    });

    let removed: f64 = data
        .elevation
        .iter()
        .zip(&elevation)
        .map(|(before, after)| before - after)
        .sum();
    data.elevation = elevation;
    removed
}
