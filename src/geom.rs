//! 2D/3D floating point vector primitives shared by the solvers, the line
//! fitter and the image sampler.
//!
//! These are thin aliases over [`nalgebra`] vectors rather than a bespoke
//! type: every later component (line fit's eigensolver, the per-block
//! least-squares refit) already needs `nalgebra`, so there is no benefit to
//! a second vector type.

use nalgebra::{Vector2, Vector3};

/// A point or color in continuous RGB / position space.
pub type Vec3 = Vector3<f64>;

/// A 2D UV or pixel-space coordinate.
pub type Vec2 = Vector2<f64>;

/// Component-wise clamp of a 3-vector into `[lo, hi]`.
pub fn clamp3(v: Vec3, lo: f64, hi: f64) -> Vec3 {
	Vec3::new(v.x.clamp(lo, hi), v.y.clamp(lo, hi), v.z.clamp(lo, hi))
}

/// Linear interpolation between two 3-vectors.
pub fn mix3(a: Vec3, b: Vec3, t: f64) -> Vec3 {
	a * (1.0 - t) + b * t
}

/// Linear interpolation between two 2-vectors.
pub fn mix2(a: Vec2, b: Vec2, t: f64) -> Vec2 {
	a * (1.0 - t) + b * t
}

/// Component-wise fractional part, matching GLSL's `fract`.
pub fn fract2(v: Vec2) -> Vec2 {
	Vec2::new(v.x - v.x.floor(), v.y - v.y.floor())
}

/// The four integer texel offsets and bilinear weights for sampling at `p`:
/// `q = p - 0.5`; texels at `floor(q) + {(0,0),(1,0),(0,1),(1,1)}`.
///
/// Returns `((x0, y0), (x1, y1), (w00, w10, w01, w11))` where `w00` is the
/// weight of `(x0, y0)`, `w10` of `(x1, y0)`, `w01` of `(x0, y1)`, `w11` of
/// `(x1, y1)`.
pub fn bilinear_footprint(p: Vec2) -> ((i64, i64), (i64, i64), (f64, f64, f64, f64)) {
	let q = p - Vec2::new(0.5, 0.5);
	let p0 = Vec2::new(q.x.floor(), q.y.floor());
	let w = fract2(q);

	let x0 = p0.x as i64;
	let y0 = p0.y as i64;
	let x1 = x0 + 1;
	let y1 = y0 + 1;

	let w00 = (1.0 - w.x) * (1.0 - w.y);
	let w10 = w.x * (1.0 - w.y);
	let w01 = (1.0 - w.x) * w.y;
	let w11 = w.x * w.y;

	((x0, y0), (x1, y1), (w00, w10, w01, w11))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bilinear_weights_partition_unity() {
		for &(px, py) in &[(0.3, 0.7), (4.9, 1.1), (-2.25, 3.75)] {
			let (_, _, (w00, w10, w01, w11)) = bilinear_footprint(Vec2::new(px, py));
			assert!((w00 + w10 + w01 + w11 - 1.0).abs() < 1e-12);
		}
	}

	#[test]
	fn clamp3_clamps_each_channel() {
		let v = clamp3(Vec3::new(-5.0, 128.0, 300.0), 0.0, 255.0);
		assert_eq!(v, Vec3::new(0.0, 128.0, 255.0));
	}

	#[test]
	fn mix3_interpolates() {
		let a = Vec3::new(0.0, 0.0, 0.0);
		let b = Vec3::new(10.0, 20.0, 30.0);
		assert_eq!(mix3(a, b, 0.5), Vec3::new(5.0, 10.0, 15.0));
	}
}
