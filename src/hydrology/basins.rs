//! Drainage basins: which terminal region each region's water ends up in.

use std::collections::HashMap;

use crate::graph::RegionId;

use super::RegionData;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Walk {
    Unseen,
    OnPath,
    Done,
}

/// Terminal region of every region's receiver chain.
///
/// A terminal is a region with no receiver: ocean, a closed lake, or a sink.
/// Regions whose chain runs into a cycle get `None`.
pub fn drainage_basins(data: &RegionData) -> Vec<Option<RegionId>> {
    let n = data.len();
    let mut basin: Vec<Option<RegionId>> = vec![None; n];
    let mut state = vec![Walk::Unseen; n];
    let mut path = Vec::new();

    for start in 0..n {
        if state[start] == Walk::Done {
            continue;
        }

        let mut current = start;
        let terminal = loop {
            match state[current] {
                Walk::Done => break basin[current],
                Walk::OnPath => break None,
                Walk::Unseen => {}
            }
            state[current] = Walk::OnPath;
            path.push(current);
            match data.receiver(current) {
                Some(next) => current = next,
                None => break Some(current),
            }
        };

        for r in path.drain(..) {
            basin[r] = terminal;
            state[r] = Walk::Done;
        }
    }

    basin
}

/// Total rainfall collected by each terminal region.
pub fn basin_rainfall(data: &RegionData, basins: &[Option<RegionId>]) -> HashMap<RegionId, f64> {
    let mut totals = HashMap::new();
    for (r, terminal) in basins.iter().enumerate() {
        if let Some(t) = terminal {
            *totals.entry(*t).or_insert(0.0) += data.rainfall[r];
        }
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basins_follow_receivers() {
        let mut data = RegionData::with_elevation(vec![-1.0, 1.0, 2.0, 3.0, -1.0]);
        data.downhill = vec![None, Some(0), Some(1), Some(4), None];
        let basins = drainage_basins(&data);
        assert_eq!(basins, vec![Some(0), Some(0), Some(0), Some(4), Some(4)]);

        let totals = basin_rainfall(&data, &basins);
        assert_eq!(totals[&0], 3.0);
        assert_eq!(totals[&4], 2.0);
    }

    #[test]
    fn test_cycle_has_no_basin() {
        let mut data = RegionData::with_elevation(vec![1.0, 1.0, 2.0, 0.5]);
        data.drainage = vec![Some(1), Some(0), None, None];
        data.downhill = vec![None, None, Some(0), None];
        let basins = drainage_basins(&data);
        assert_eq!(basins, vec![None, None, None, Some(3)]);
        assert!(!basin_rainfall(&data, &basins).contains_key(&0));
    }
}
