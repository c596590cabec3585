//! World save/load
//!
//! Stores the mesh topology and every region array in a bincode file, so a
//! world can be reloaded without re-triangulating. Region pointers are stored
//! as `i32` with -1 for "none", mesh indices as `u32`.

use std::fs;
use std::io;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::geometry::LatLon;
use crate::graph::RegionId;
use crate::hydrology::{collect_lakes, RegionData};
use crate::mesh::SphereMesh;
use crate::seeds::WorldSeeds;
use crate::world::WorldState;

/// Save file layout.
#[derive(Serialize, Deserialize)]
struct WorldSaveFile {
    /// Format version for forward compatibility
    version: u32,
    seeds: WorldSeeds,
    pole: u32,
    lat: Vec<f64>,
    lon: Vec<f64>,
    triangles: Vec<u32>,
    halfedges: Vec<u32>,
    elevation: Vec<f64>,
    downhill: Vec<i32>,
    drainage: Vec<i32>,
    waterpool: Vec<f64>,
    flux: Vec<f64>,
    rainfall: Vec<f64>,
    moisture: Vec<f64>,
    waterfall: Vec<bool>,
}

const SAVE_VERSION: u32 = 1;

const NO_REGION: i32 = -1;

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

fn index_to_u32(v: usize, what: &str) -> io::Result<u32> {
    u32::try_from(v).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("{} index {} does not fit in u32", what, v))
    })
}

fn to_u32(values: &[usize], what: &str) -> io::Result<Vec<u32>> {
    values.iter().map(|&v| index_to_u32(v, what)).collect()
}

fn encode_pointers(pointers: &[Option<RegionId>]) -> io::Result<Vec<i32>> {
    pointers
        .iter()
        .map(|p| match p {
            None => Ok(NO_REGION),
            Some(r) => i32::try_from(*r).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, format!("region {} does not fit in i32", r))
            }),
        })
        .collect()
}

fn decode_pointers(pointers: &[i32], num_regions: usize, what: &str) -> io::Result<Vec<Option<RegionId>>> {
    pointers
        .iter()
        .map(|&p| {
            if p == NO_REGION {
                return Ok(None);
            }
            match usize::try_from(p) {
                Ok(r) if r < num_regions => Ok(Some(r)),
                _ => Err(invalid_data(format!("{} pointer {} out of range", what, p))),
            }
        })
        .collect()
}

/// Serialize a world to bytes.
pub fn to_bytes(world: &WorldState) -> io::Result<Vec<u8>> {
    let mesh = &world.mesh;
    let data = &world.data;

    let save = WorldSaveFile {
        version: SAVE_VERSION,
        seeds: world.seeds.clone(),
        pole: index_to_u32(mesh.pole(), "pole")?,
        lat: mesh.lat_lons().iter().map(|p| p.lat).collect(),
        lon: mesh.lat_lons().iter().map(|p| p.lon).collect(),
        triangles: to_u32(mesh.topology().triangles(), "triangle")?,
        halfedges: to_u32(mesh.topology().halfedges(), "half-edge")?,
        elevation: data.elevation.clone(),
        downhill: encode_pointers(&data.downhill)?,
        drainage: encode_pointers(&data.drainage)?,
        waterpool: data.waterpool.clone(),
        flux: data.flux.clone(),
        rainfall: data.rainfall.clone(),
        moisture: data.moisture.clone(),
        waterfall: data.waterfall.clone(),
    };

    bincode::serialize(&save).map_err(|e| {
        io::Error::new(io::ErrorKind::Other, format!("Serialization failed: {}", e))
    })
}

/// Rebuild a world from bytes written by [`to_bytes`].
pub fn from_bytes(bytes: &[u8]) -> io::Result<WorldState> {
    let save: WorldSaveFile = bincode::deserialize(bytes)
        .map_err(|e| invalid_data(format!("Deserialization failed: {}", e)))?;

    if save.version > SAVE_VERSION {
        return Err(invalid_data(format!(
            "Save file version {} is newer than supported version {}",
            save.version, SAVE_VERSION,
        )));
    }

    let n = save.lat.len();
    let lengths = [
        save.lon.len(),
        save.elevation.len(),
        save.downhill.len(),
        save.drainage.len(),
        save.waterpool.len(),
        save.flux.len(),
        save.rainfall.len(),
        save.moisture.len(),
        save.waterfall.len(),
    ];
    if lengths.iter().any(|&len| len != n) {
        return Err(invalid_data(format!(
            "region arrays disagree on length: {} vs {:?}",
            n, lengths
        )));
    }

    let lat_lon = save
        .lat
        .iter()
        .zip(&save.lon)
        .map(|(&lat, &lon)| LatLon { lat, lon })
        .collect();
    let triangles = save.triangles.iter().map(|&v| v as usize).collect();
    let halfedges = save.halfedges.iter().map(|&v| v as usize).collect();

    let mesh = SphereMesh::from_topology(lat_lon, triangles, halfedges, save.pole as usize)
        .map_err(|e| invalid_data(format!("stored mesh is invalid: {}", e)))?;

    let data = RegionData {
        elevation: save.elevation,
        downhill: decode_pointers(&save.downhill, n, "downhill")?,
        drainage: decode_pointers(&save.drainage, n, "drainage")?,
        waterpool: save.waterpool,
        flux: save.flux,
        rainfall: save.rainfall,
        moisture: save.moisture,
        waterfall: save.waterfall,
    };

    let mut world = WorldState::new(save.seeds, mesh, data);
    world.report.lakes = collect_lakes(&world.mesh, &world.data);
    world.report.waterfalls = world.data.waterfall.iter().filter(|&&w| w).count();
    Ok(world)
}

/// Save a world to a binary file.
pub fn save_world(world: &WorldState, path: &Path) -> io::Result<()> {
    let bytes = to_bytes(world)?;
    fs::write(path, &bytes)?;
    info!("Saved world ({} regions, {} bytes) to {}", world.num_regions(), bytes.len(), path.display());
    Ok(())
}

/// Load a world from a binary file.
pub fn load_world(path: &Path) -> io::Result<WorldState> {
    let bytes = fs::read(path)?;
    let world = from_bytes(&bytes)?;
    info!("Loaded world ({} regions) from {}", world.num_regions(), path.display());
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::world::generate;

    fn world() -> WorldState {
        generate(&WorldConfig::new(31, 400)).unwrap()
    }

    #[test]
    fn test_bytes_round_trip() {
        let original = world();
        let loaded = from_bytes(&to_bytes(&original).unwrap()).unwrap();
        assert_eq!(loaded.seeds, original.seeds);
        assert_eq!(loaded.data, original.data);
        assert_eq!(loaded.mesh.pole(), original.mesh.pole());
        for r in 0..original.num_regions() {
            assert_eq!(loaded.mesh.neighbors(r), original.mesh.neighbors(r));
        }
        assert_eq!(loaded.lakes().len(), original.lakes().len());
    }

    #[test]
    fn test_rejects_garbage() {
        let err = from_bytes(&[1, 2, 3]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_rejects_newer_version() {
        let mut bytes = to_bytes(&world()).unwrap();
        // The version is the first field, a little-endian u32
        bytes[0..4].copy_from_slice(&(SAVE_VERSION + 1).to_le_bytes());
        let err = from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_pointer_encoding() {
        let encoded = encode_pointers(&[None, Some(3), Some(0)]).unwrap();
        assert_eq!(encoded, vec![-1, 3, 0]);
        assert_eq!(decode_pointers(&encoded, 4, "test").unwrap(), vec![None, Some(3), Some(0)]);
        assert!(decode_pointers(&[7], 4, "test").is_err());
        assert!(decode_pointers(&[-5], 4, "test").is_err());
    }
}
