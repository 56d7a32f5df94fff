use std::fs;

use seamtex::geom::{Vec2, Vec3};
use seamtex::mesh::obj::{load_obj_file, save_obj_file};
use seamtex::mesh::{Face, Mesh};

fn quad_pair_mesh() -> Mesh {
	let mut m = Mesh::new();
	m.positions = vec![
		Vec3::new(0.0, 0.0, 0.0),
		Vec3::new(1.0, 0.0, 0.0),
		Vec3::new(1.0, 1.0, 0.0),
		Vec3::new(0.0, 1.0, 0.0),
	];
	m.uvs = vec![
		Vec2::new(0.0, 0.0),
		Vec2::new(0.5, 0.0),
		Vec2::new(0.5, 0.5),
		Vec2::new(1.0, 0.0),
		Vec2::new(1.0, 0.5),
	];
	m.faces = vec![
		Face { pi: vec![0, 1, 2], ti: vec![0, 1, 2] },
		Face { pi: vec![1, 2, 3], ti: vec![3, 4, 0] },
	];
	m.face_material = vec![None, None];
	m
}

#[test]
fn seam_extraction_finds_the_shared_edge() {
	let mut m = quad_pair_mesh();
	m.compute_seams();
	assert_eq!(m.seams.len(), 1);
}

#[test]
fn a_mesh_with_no_shared_edges_has_no_seams() {
	let mut m = Mesh::new();
	m.positions = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
	m.uvs = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
	m.faces = vec![Face { pi: vec![0, 1, 2], ti: vec![0, 1, 2] }];
	m.compute_seams();
	assert!(m.seams.is_empty());
}

#[test]
fn obj_round_trip_preserves_positions_and_faces() {
	let mesh = quad_pair_mesh();

	let mut path = std::env::temp_dir();
	path.push(format!("seamtex-mesh-seams-roundtrip-{}", std::process::id()));
	save_obj_file(&mesh, &path, "tex.png", false).unwrap();

	let loaded = load_obj_file(path.with_extension("obj")).unwrap();
	assert_eq!(loaded.positions.len(), mesh.positions.len());
	assert_eq!(loaded.faces.len(), mesh.faces.len());
	for (a, b) in mesh.faces.iter().zip(loaded.faces.iter()) {
		assert_eq!(a.pi, b.pi);
		assert_eq!(a.ti, b.ti);
	}

	let _ = fs::remove_file(path.with_extension("obj"));
	let _ = fs::remove_file(path.with_extension("mtl"));
}

#[test]
fn obj_missing_texture_index_is_a_hard_error() {
	let mut path = std::env::temp_dir();
	path.push(format!("seamtex-mesh-seams-badface-{}", std::process::id()));
	let obj_path = path.with_extension("obj");
	fs::write(&obj_path, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

	assert!(load_obj_file(&obj_path).is_err());

	let _ = fs::remove_file(obj_path);
}
