//! Seam-aware pixel solver.
//!
//! Grounded in `original_source/src/solver.cpp`'s `Solver::fixSeams`: lazily
//! allocate three variables per referenced pixel, add a seamless residual per
//! seam sample and an identity residual per referenced pixel, solve, then
//! write clamped values back into the image.

use crate::error::Result;
use crate::geom::{clamp3, fract2, Vec2, Vec3};
use crate::image::{Image, MaskBit};
use crate::linexpr::{eq3, eq3_const, mix3, LinVec3};
use crate::lsq::EquationSet;
use crate::mesh::Mesh;

/// Total / seamless-only / identity-only squared residuals, before and after
/// a solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
	pub before_total: f64,
	pub before_seamless: f64,
	pub before_identity: f64,
	pub after_total: f64,
	pub after_seamless: f64,
	pub after_identity: f64,
}

/// Seam-aware pixel solver: makes an [`Image`] seamless across a mesh's UV
/// seams in place.
#[derive(Debug, Clone, Default)]
pub struct Solver {
	sys: EquationSet,
	vi: Vec<i64>,
	resx: i64,
	resy: i64,
}

impl Solver {
	pub fn new() -> Self {
		Solver::default()
	}

	fn index_of(&self, x: i64, y: i64) -> usize {
		let x = x.rem_euclid(self.resx);
		let y = y.rem_euclid(self.resy);
		(y * self.resx + x) as usize
	}

	/// The lazily-allocated [`LinVec3`] of variables backing pixel `(x, y)`.
	fn pixel_vars(&mut self, x: i64, y: i64) -> LinVec3 {
		let i = self.index_of(x, y);
		if self.vi[i] == -1 {
			self.vi[i] = self.sys.nvar() as i64;
			self.sys.new_lin_vec3()
		} else {
			LinVec3::from_vars(self.vi[i] as usize)
		}
	}

	/// The bilinearly-mixed [`LinVec3`] at continuous position `p`.
	fn pixel_at(&mut self, p: Vec2) -> LinVec3 {
		let q = p - Vec2::new(0.5, 0.5);
		let p0 = Vec2::new(q.x.floor(), q.y.floor());
		let p1 = p0 + Vec2::new(1.0, 1.0);
		let w = fract2(q);

		let v00 = self.pixel_vars(p0.x as i64, p0.y as i64);
		let v10 = self.pixel_vars(p1.x as i64, p0.y as i64);
		let v01 = self.pixel_vars(p0.x as i64, p1.y as i64);
		let v11 = self.pixel_vars(p1.x as i64, p1.y as i64);

		mix3(mix3(v00, v10, w.x), mix3(v01, v11, w.x), w.y)
	}

	/// Makes `img` seamless across `mesh`'s UV seams, in place. Returns a
	/// before/after residual report for logging.
	pub fn fix_seams(&mut self, mesh: &Mesh, img: &mut Image) -> Result<SolveReport> {
		self.resx = img.resx;
		self.resy = img.resy;
		self.vi = vec![-1; (self.resx * self.resy) as usize];
		self.sys.clear();

		let imgsz = Vec2::new(self.resx as f64, self.resy as f64);

		log::info!("fix_seams: {} seams over a {}x{} image", mesh.seams.len(), self.resx, self.resy);

		for seam in &mesh.seams {
			let d = mesh.max_length(seam, imgsz).max(1e-9);
			let step = 1.0 / (2.0 * d);
			let mut t = 0.0;
			while t <= 1.0 {
				let pa = mesh.uv_pos(seam.0, t).component_mul(&imgsz);
				let pb = mesh.uv_pos(seam.1, t).component_mul(&imgsz);
				let va = self.pixel_at(pa);
				let vb = self.pixel_at(pb);
				self.sys.add_equation3(eq3(va, vb));
				t += step;
			}
		}

		let num_seamless_equations = self.sys.num_equations();

		for y in 0..self.resy {
			for x in 0..self.resx {
				if self.vi[self.index_of(x, y)] != -1 {
					let w = if img.mask(x, y).contains(MaskBit::INTERNAL) { 1.0 } else { 0.1 };
					let pv = self.pixel_vars(x, y);
					let target = img.pixel(x, y);
					self.sys.add_equation3(eq3_const(pv, target).scale(w));
				}
			}
		}

		let mut vars = Vec::new();
		self.sys.initialize_vars(&mut vars);

		let before_total = self.sys.squared_error_for(&vars);
		let before_seamless = squared_error_over(&self.sys, &vars, 0..num_seamless_equations);
		let before_identity = squared_error_over(&self.sys, &vars, num_seamless_equations..self.sys.num_equations());

		debug_assert!((before_total - (before_seamless + before_identity)).abs() < 1e-3);

		vars = self.sys.solve()?;

		let after_total = self.sys.squared_error_for(&vars);
		let after_seamless = squared_error_over(&self.sys, &vars, 0..num_seamless_equations);
		let after_identity = squared_error_over(&self.sys, &vars, num_seamless_equations..self.sys.num_equations());

		log::info!("fix_seams: total error {before_total} -> {after_total}");
		log::info!("fix_seams: seamless error {before_seamless} -> {after_seamless}");
		log::info!("fix_seams: identity error {before_identity} -> {after_identity}");

		for y in 0..self.resy {
			for x in 0..self.resx {
				if self.vi[self.index_of(x, y)] != -1 {
					let pv = self.pixel_vars(x, y);
					let c = clamp3(pv.evaluate(&vars), 0.0, 255.0);
					img.set_pixel(x, y, c);
				}
			}
		}

		Ok(SolveReport {
			before_total,
			before_seamless,
			before_identity,
			after_total,
			after_seamless,
			after_identity,
		})
	}
}

/// Sums squared residuals over an equation index range, without
/// constructing a second [`EquationSet`] (the original C++ copies the
/// equation set itself to slice by range; we slice indices instead since
/// `nalgebra_sparse` factorization is the expensive part we want to avoid
/// repeating).
fn squared_error_over(sys: &EquationSet, vars: &[f64], range: std::ops::Range<usize>) -> f64 {
	sys.equations_in(range).map(|e| { let r = e.evaluate(vars); r * r }).sum()
}
