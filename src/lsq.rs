//! Sparse least-squares equation set and solver.
//!
//! Assembles the normal equations `AᵀA x = Aᵀb` from a set of scalar linear
//! residuals and solves them with a sparse Cholesky factorization. The
//! original implementation uses `Eigen::SimplicialLDLT` over an
//! `Eigen::SparseMatrix`; [`nalgebra_sparse::factorization::CscCholesky`] is
//! the equivalent pure-Rust machinery, built on the same `nalgebra` stack
//! already in use for the line fit and per-block endpoint refinement.

use nalgebra::DVector;
use nalgebra_sparse::factorization::CscCholesky;
use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::error::{Error, Result};
use crate::linexpr::{LinExp, LinVec2, LinVec3, VarId};

/// A set of scalar residual equations over a growing pool of variables.
///
/// Mirrors the original `LinearEquationSet`: variables are allocated
/// consecutively (`new_var`, `new_lin_vec2/3`), equations are appended in
/// the order callers add them, and the system is solved in the
/// least-squares sense.
#[derive(Debug, Clone, Default)]
pub struct EquationSet {
	nvar: usize,
	equations: Vec<LinExp>,
}

impl EquationSet {
	/// An empty equation set over zero variables.
	pub fn new() -> Self {
		EquationSet::default()
	}

	/// Discards all variables and equations.
	pub fn clear(&mut self) {
		self.nvar = 0;
		self.equations.clear();
	}

	/// Number of variables allocated so far.
	pub fn nvar(&self) -> usize {
		self.nvar
	}

	/// Number of scalar equations added so far.
	pub fn num_equations(&self) -> usize {
		self.equations.len()
	}

	/// Allocates and returns a fresh variable id.
	pub fn new_var(&mut self) -> VarId {
		let v = self.nvar;
		self.nvar += 1;
		v
	}

	/// Allocates two consecutive variable ids as a [`LinVec2`].
	pub fn new_lin_vec2(&mut self) -> LinVec2 {
		let first = self.new_var();
		self.new_var();
		LinVec2::from_vars(first)
	}

	/// Allocates three consecutive variable ids as a [`LinVec3`].
	pub fn new_lin_vec3(&mut self) -> LinVec3 {
		let first = self.new_var();
		self.new_var();
		self.new_var();
		LinVec3::from_vars(first)
	}

	/// Appends a scalar residual equation (`expr == 0`).
	pub fn add_equation(&mut self, expr: LinExp) {
		self.equations.push(expr);
	}

	/// Appends the three component residuals of a vector equation.
	pub fn add_equation3(&mut self, v: LinVec3) {
		self.equations.push(v.x);
		self.equations.push(v.y);
		self.equations.push(v.z);
	}

	/// Appends the two component residuals of a vector equation.
	pub fn add_equation2(&mut self, v: LinVec2) {
		self.equations.push(v.x);
		self.equations.push(v.y);
	}

	/// The sum of squared residuals for a variable assignment.
	pub fn squared_error_for(&self, x: &[f64]) -> f64 {
		self.equations.iter().map(|e| { let r = e.evaluate(x); r * r }).sum()
	}

	/// Iterates the equations in `range`, for callers that need a residual
	/// breakdown over a sub-range without cloning the whole set.
	pub fn equations_in(&self, range: std::ops::Range<usize>) -> impl Iterator<Item = &LinExp> {
		self.equations[range].iter()
	}

	/// Sizes `x` to `nvar`, zero-fills it, then seeds any single-term
	/// equation's variable with `x = -b/a` as a warm start.
	pub fn initialize_vars(&self, x: &mut Vec<f64>) {
		x.clear();
		x.resize(self.nvar, 0.0);
		for e in &self.equations {
			if let Some((var, val)) = e.invert() {
				x[var] = val;
			}
		}
	}

	/// Solves the least-squares system `min_x Σ eq_i(x)²` by factoring the
	/// normal equations `AᵀA x = Aᵀb`.
	///
	/// Returns [`Error::SolveError`] if the normal matrix is not
	/// symmetric positive (semi-)definite enough for the sparse Cholesky
	/// factorization to succeed; callers should treat this the same as any
	/// other stage failure.
	pub fn solve(&self) -> Result<Vec<f64>> {
		let n = self.nvar;
		if n == 0 {
			return Ok(Vec::new());
		}

		let mut ata = CooMatrix::<f64>::new(n, n);
		let mut atb = vec![0.0_f64; n];

		for e in &self.equations {
			let rhs = -e.b;
			let terms: Vec<(VarId, f64)> = e.terms.iter().map(|(&i, &a)| (i, a)).collect();
			for &(i, ai) in &terms {
				atb[i] += ai * rhs;
				for &(j, aj) in &terms {
					ata.push(i, j, ai * aj);
				}
			}
		}

		let ata_csc = CscMatrix::from(&ata);
		let chol = CscCholesky::factor(&ata_csc)
			.map_err(|e| Error::SolveError(format!("normal equations are not SPD: {e:?}")))?;

		let b = DVector::from_vec(atb);
		let x = chol.solve(&b);

		Ok(x.as_slice().to_vec())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::linexpr::eq;

	#[test]
	fn solves_simple_overdetermined_system() {
		// x = 4 from two consistent equations: 3x + 2y = 12 with y fixed at 0, 10x = 40
		let mut set = EquationSet::new();
		let x = set.new_var();
		let y = set.new_var();

		let mut e0 = LinExp::variable(x) * 3.0 + LinExp::variable(y) * 2.0;
		e0.b = -12.0;
		let mut e1 = LinExp::variable(x) * 10.0;
		e1.b = -14.0;
		let e1_plus_e0 = e1.clone() + e0.clone();

		set.add_equation(e0);
		set.add_equation(e1);
		set.add_equation(e1_plus_e0 * 1.0);

		let sol = set.solve().unwrap();
		assert!((sol[0] - 4.0).abs() < 1e-6);
		assert!((sol[1] - 0.0).abs() < 1e-6);
	}

	#[test]
	fn initialize_vars_seeds_invertible_equations() {
		let mut set = EquationSet::new();
		let x = set.new_var();
		set.add_equation(eq(LinExp::variable(x) * 2.0, LinExp::constant(10.0)));

		let mut vars = Vec::new();
		set.initialize_vars(&mut vars);
		assert!((vars[0] - 5.0).abs() < 1e-9);
	}

	#[test]
	fn squared_error_matches_manual_sum() {
		let mut set = EquationSet::new();
		let x = set.new_var();
		set.add_equation(eq(LinExp::variable(x), LinExp::constant(3.0)));
		let err = set.squared_error_for(&[5.0]);
		assert!((err - 4.0).abs() < 1e-12);
	}

	#[test]
	fn empty_system_solves_to_empty_vector() {
		let set = EquationSet::new();
		assert_eq!(set.solve().unwrap(), Vec::<f64>::new());
	}
}
