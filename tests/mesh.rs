//! Mesh construction on real point sets.

use planet_mesh::mesh::half_edge::next_side_in_triangle;
use planet_mesh::{build_sphere_mesh, generate_points, LatLon, MeshError, RegionGraph};

#[test]
fn test_mesh_closure_and_symmetry() {
    for &(seed, n) in &[(1u64, 100usize), (2, 1000), (3, 5000)] {
        let mesh = build_sphere_mesh(generate_points(seed, n, 0.75).unwrap()).unwrap();
        mesh.validate().unwrap();

        let topo = mesh.topology();
        for s in 0..topo.num_sides() {
            let o = topo.opposite_side(s);
            assert_eq!(topo.opposite_side(o), s);
            assert_eq!(topo.side_begin_region(o), topo.triangles()[next_side_in_triangle(s)]);
        }

        let degree_sum: usize = (0..mesh.num_regions()).map(|r| mesh.degree(r)).sum();
        assert_eq!(degree_sum, 2 * mesh.num_edges());
        assert_eq!(mesh.num_triangles(), 2 * n - 4);
    }
}

#[test]
fn test_neighbors_are_close() {
    let n = 2000;
    let mesh = build_sphere_mesh(generate_points(5, n, 0.5).unwrap()).unwrap();
    // Mean spacing on the unit sphere is about sqrt(4 pi / n)
    let spacing = (4.0 * std::f64::consts::PI / n as f64).sqrt();
    for r in 0..mesh.num_regions() {
        for &nb in RegionGraph::neighbors(&mesh, r) {
            assert!(mesh.edge_length(r, nb) < 4.0 * spacing);
        }
    }
}

#[test]
fn test_mesh_is_deterministic() {
    let a = build_sphere_mesh(generate_points(42, 800, 0.75).unwrap()).unwrap();
    let b = build_sphere_mesh(generate_points(42, 800, 0.75).unwrap()).unwrap();
    assert_eq!(a.topology(), b.topology());
    assert_eq!(a.lat_lons(), b.lat_lons());
}

#[test]
fn test_partial_sphere_still_closes() {
    // Drop the northern cap so the highest point sits near latitude 10
    let points: Vec<_> = generate_points(8, 400, 0.0)
        .unwrap()
        .into_iter()
        .filter(|p| p.lat < 10.0)
        .collect();
    let n = points.len();
    let mesh = build_sphere_mesh(points).unwrap();
    mesh.validate().unwrap();
    assert!(mesh.lat_lon(mesh.pole()).lat < 10.0);
    assert_eq!(mesh.num_triangles(), 2 * n - 4);
}

#[test]
fn test_too_few_points() {
    let points = vec![LatLon::new(0.0, 0.0), LatLon::new(0.0, 90.0), LatLon::new(45.0, 0.0)];
    assert!(matches!(
        build_sphere_mesh(points),
        Err(MeshError::TooFewPoints { required: 4, got: 3 })
    ));
}
