//! Best-fit line through a point cloud in RGB space.
//!
//! Used by the BC1 encoder to find the principal color axis of a 4x4 block.

use nalgebra::{Matrix3, SymmetricEigen};

use crate::geom::Vec3;

/// A line in 3D space, parameterized as `o + t * d` with `|d| == 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line3 {
	/// A point the line passes through (the point cloud's centroid, when fit).
	pub o: Vec3,
	/// The (unit-length) line direction.
	pub d: Vec3,
}

impl Line3 {
	/// Evaluates the line at parameter `t`.
	pub fn at(&self, t: f64) -> Vec3 {
		self.o + self.d * t
	}
}

/// Fits the best line (by PCA) through `points`.
///
/// - 1 point: degenerate fallback, direction `(1,0,0)`.
/// - 2 points: the segment direction, or the 1-point fallback if they
///   coincide.
/// - 3+ points: centroid + the largest-eigenvalue eigenvector of the
///   centered scatter matrix `XᵀX`.
///
/// # Panics
/// Panics if `points` is empty, or if the fit line's origin/direction are
/// not finite.
pub fn fit_line(points: &[Vec3]) -> Line3 {
	assert!(!points.is_empty(), "fit_line requires at least one point");

	let line = match points.len() {
		1 => Line3 {
			o: points[0],
			d: Vec3::new(1.0, 0.0, 0.0),
		},
		2 => {
			let d = points[1] - points[0];
			let len = d.norm();
			if len > 0.0 {
				Line3 {
					o: (points[0] + points[1]) * 0.5,
					d: d / len,
				}
			} else {
				Line3 {
					o: points[0],
					d: Vec3::new(1.0, 0.0, 0.0),
				}
			}
		}
		_ => fit_line_pca(points),
	};

	assert!(line.o.iter().all(|c| c.is_finite()));
	assert!(line.d.iter().all(|c| c.is_finite()));
	assert!(line.d.norm() > 0.0);

	line
}

fn fit_line_pca(points: &[Vec3]) -> Line3 {
	let n = points.len() as f64;
	let mean = points.iter().fold(Vec3::zeros(), |acc, p| acc + p) / n;

	let mut scatter = Matrix3::<f64>::zeros();
	for p in points {
		let c = p - mean;
		scatter += c * c.transpose();
	}

	let eigen = SymmetricEigen::new(scatter);
	let (max_idx, _) = eigen
		.eigenvalues
		.iter()
		.enumerate()
		.max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap())
		.expect("scatter matrix has 3 eigenvalues");

	let d = eigen.eigenvectors.column(max_idx).into_owned();
	let norm = d.norm();

	Line3 {
		o: mean,
		d: if norm > 0.0 { d / norm } else { Vec3::new(1.0, 0.0, 0.0) },
	}
}
