use seamtex::geom::{Vec2, Vec3};
use seamtex::image::{Image, MaskBit};
use seamtex::mesh::{Face, Mesh};
use seamtex::solver::Solver;

fn split_color_mesh() -> Mesh {
	// An 8x4 strip, two triangles, UVs spanning the full image, with a seam
	// pairing UV column x=0 to UV column x=7 (the left/right image edges)
	// at every row.
	let mut mesh = Mesh::new();
	mesh.positions = vec![
		Vec3::new(0.0, 0.0, 0.0),
		Vec3::new(1.0, 0.0, 0.0),
		Vec3::new(1.0, 1.0, 0.0),
		Vec3::new(0.0, 1.0, 0.0),
	];
	mesh.uvs = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
	mesh.faces = vec![Face { pi: vec![0, 1, 2], ti: vec![0, 1, 2] }, Face { pi: vec![0, 2, 3], ti: vec![0, 2, 3] }];
	mesh.face_material = vec![None, None];
	// Manually pin a seam between the UV edge (0,3) (x=0 column) and (1,2) (x=7 column).
	mesh.seams = vec![((0, 3), (1, 2))];
	mesh
}

fn split_color_image() -> Image {
	let mut img = Image::new(8, 4);
	for y in 0..4 {
		for x in 0..8 {
			let c = if x < 4 { Vec3::new(255.0, 0.0, 0.0) } else { Vec3::new(0.0, 255.0, 0.0) };
			img.set_pixel(x, y, c);
			img.set_mask(x, y, MaskBit::INTERNAL);
		}
	}
	img
}

/// After `fix_seams`, the paired seam samples agree per channel within the
/// solver's tolerance.
#[test]
fn seam_samples_agree_after_fix_seams() {
	let mesh = split_color_mesh();
	let mut img = split_color_image();

	let mut solver = Solver::new();
	solver.fix_seams(&mesh, &mut img).unwrap();

	for y in 0..4 {
		let a = img.sample(Vec2::new(0.5, y as f64 + 0.5));
		let b = img.sample(Vec2::new(7.5, y as f64 + 0.5));
		assert!((a - b).norm() < 1e-2, "seam mismatch at row {y}: {a:?} vs {b:?}");
	}
}

/// A seam walked near the x boundary must mark texels on both sides of the
/// toroidal wraparound.
#[test]
fn seam_mask_wraps_across_the_x_boundary() {
	let mut mesh = Mesh::new();
	mesh.positions = vec![Vec3::zeros(); 4];
	mesh.uvs = vec![Vec2::new(0.0, 0.0), Vec2::new(0.0, 1.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)];
	mesh.seams = vec![((0, 1), (2, 3))];

	let mut img = Image::new(8, 8);
	img.set_mask_seam(&mesh);

	assert!(img.mask(0, 4).contains(MaskBit::SEAM));
	assert!(img.mask(7, 4).contains(MaskBit::SEAM));
}

/// Toroidal addressing agrees for wrapped and unwrapped coordinates.
#[test]
fn toroidal_addressing_agrees_for_wrapped_coordinates() {
	let mut img = Image::new(5, 3);
	img.set_pixel(2, 1, Vec3::new(11.0, 22.0, 33.0));
	img.set_mask(2, 1, MaskBit::SEAM);

	assert_eq!(img.pixel(2, 1), img.pixel(2 - 5, 1 - 3));
	assert_eq!(img.pixel(2, 1), img.pixel(2 + 5 * 4, 1 + 3 * 7));
	assert_eq!(img.mask(2, 1), img.mask(2 - 5, 1 + 3));
}

/// Seam extraction is invariant under per-face vertex rotation.
#[test]
fn seam_extraction_is_rotation_invariant() {
	let mut a = split_color_mesh();
	a.faces[0].pi.rotate_left(1);
	a.faces[0].ti.rotate_left(1);
	a.compute_seams();

	let mut b = split_color_mesh();
	b.compute_seams();

	assert_eq!(a.seams.len(), b.seams.len());
}

/// The sum of squared seam residuals never increases across `fix_seams`
/// (measured via the returned report's seamless component).
#[test]
fn seam_residual_never_increases_after_fix_seams() {
	let mesh = split_color_mesh();
	let mut img = split_color_image();

	let mut solver = Solver::new();
	let report = solver.fix_seams(&mesh, &mut img).unwrap();
	assert!(report.after_seamless <= report.before_seamless + 1e-6);
}

/// An interior (`Internal`) pixel drifts less from its source color than an
/// otherwise-identical but non-interior pixel, since its identity weight is
/// ten times larger.
#[test]
fn invariant_identity_weight_favors_internal_pixels() {
	let mesh = split_color_mesh();
	let mut internal_img = split_color_image();
	let mut weak_img = split_color_image();
	for y in 0..4 {
		for x in 0..8 {
			weak_img.set_mask(x, y, MaskBit::empty());
		}
	}

	let source = split_color_image();

	Solver::new().fix_seams(&mesh, &mut internal_img).unwrap();
	Solver::new().fix_seams(&mesh, &mut weak_img).unwrap();

	let drift_internal: f64 = (0..4)
		.map(|y| (internal_img.pixel(0, y) - source.pixel(0, y)).norm())
		.sum();
	let drift_weak: f64 = (0..4).map(|y| (weak_img.pixel(0, y) - source.pixel(0, y)).norm()).sum();

	assert!(drift_internal <= drift_weak + 1e-6);
}
