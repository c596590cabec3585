//! Save/load round trip through a file.

use planet_mesh::persistence::{load_world, save_world};
use planet_mesh::{generate, WorldConfig};

#[test]
fn test_file_round_trip() {
    let world = generate(&WorldConfig::new(11, 600)).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("world.bin");

    save_world(&world, &path).unwrap();
    let loaded = load_world(&path).unwrap();

    assert_eq!(loaded.seeds, world.seeds);
    assert_eq!(loaded.data, world.data);
    assert_eq!(loaded.mesh.topology(), world.mesh.topology());
    assert_eq!(loaded.lakes(), world.lakes());
    loaded.mesh.validate().unwrap();
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_world(&dir.path().join("nope.bin")).is_err());
}
