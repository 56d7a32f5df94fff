//! Sparse linear expression algebra over scalar solver variables.
//!
//! A [`LinExp`] is `Σ a_i * x_i + b`. [`LinVec3`]/[`LinVec2`] lift this
//! component-wise for vector-valued quantities (pixel colors, UV positions).
//!
//! Rust's `==` must return `bool`, so it cannot double as residual
//! construction the way the original C++ overloads it. Instead, [`eq`] and
//! [`eq3`]/[`eq2`] build the residual expression explicitly;
//! [`crate::lsq::EquationSet::add_equation`] then adds "residual == 0" to
//! the system.

use std::collections::BTreeMap;
use std::ops::{Add, Mul, Neg, Sub};

use crate::geom::{Vec2, Vec3};

/// Index of a scalar solver variable.
pub type VarId = usize;

/// A sparse linear expression `Σ terms[i] * x_i + b`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinExp {
	/// Variable id -> coefficient. Kept sparse; zero coefficients are never stored.
	pub terms: BTreeMap<VarId, f64>,
	/// The constant term.
	pub b: f64,
}

impl LinExp {
	/// The zero expression.
	pub fn zero() -> Self {
		LinExp {
			terms: BTreeMap::new(),
			b: 0.0,
		}
	}

	/// A constant expression.
	pub fn constant(c: f64) -> Self {
		LinExp {
			terms: BTreeMap::new(),
			b: c,
		}
	}

	/// The expression `1 * x_var`.
	pub fn variable(var: VarId) -> Self {
		let mut terms = BTreeMap::new();
		terms.insert(var, 1.0);
		LinExp { terms, b: 0.0 }
	}

	/// Evaluates the expression for a full variable assignment.
	pub fn evaluate(&self, vars: &[f64]) -> f64 {
		let mut res = self.b;
		for (&i, &a) in &self.terms {
			res += a * vars[i];
		}
		res
	}

	/// Scales the expression in place.
	pub fn scale(&mut self, k: f64) {
		self.b *= k;
		for a in self.terms.values_mut() {
			*a *= k;
		}
	}

	/// True when this expression has exactly one nonzero term with
	/// `|coefficient|` above a small threshold -- it can be inverted to seed
	/// an initial value for its one free variable.
	pub fn is_invertible(&self) -> bool {
		self.terms.len() == 1 && self.terms.values().next().map_or(false, |a| a.abs() > 1e-4)
	}

	/// For an invertible expression, the value `x = -b/a` that zeros it.
	pub fn invert(&self) -> Option<(VarId, f64)> {
		if !self.is_invertible() {
			return None;
		}
		let (&var, &a) = self.terms.iter().next().unwrap();
		Some((var, -self.b / a))
	}
}

impl From<f64> for LinExp {
	fn from(c: f64) -> Self {
		LinExp::constant(c)
	}
}

impl From<VarId> for LinExp {
	fn from(v: VarId) -> Self {
		LinExp::variable(v)
	}
}

impl Neg for LinExp {
	type Output = LinExp;
	fn neg(mut self) -> LinExp {
		self.scale(-1.0);
		self
	}
}

impl Add for LinExp {
	type Output = LinExp;
	fn add(mut self, rhs: LinExp) -> LinExp {
		self.b += rhs.b;
		for (i, a) in rhs.terms {
			*self.terms.entry(i).or_insert(0.0) += a;
		}
		self
	}
}

impl Sub for LinExp {
	type Output = LinExp;
	fn sub(self, rhs: LinExp) -> LinExp {
		self + (-rhs)
	}
}

impl Mul<f64> for LinExp {
	type Output = LinExp;
	fn mul(mut self, k: f64) -> LinExp {
		self.scale(k);
		self
	}
}

impl Mul<LinExp> for f64 {
	type Output = LinExp;
	fn mul(self, rhs: LinExp) -> LinExp {
		rhs * self
	}
}

/// Builds the residual `lhs - rhs`, to be added to an equation set as
/// `residual == 0`.
pub fn eq(lhs: impl Into<LinExp>, rhs: impl Into<LinExp>) -> LinExp {
	lhs.into() - rhs.into()
}

/// A vec3 of linear expressions: three scalar channels that move together
/// through mixes and dot products with constant vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct LinVec3 {
	pub x: LinExp,
	pub y: LinExp,
	pub z: LinExp,
}

impl LinVec3 {
	pub fn new(x: LinExp, y: LinExp, z: LinExp) -> Self {
		LinVec3 { x, y, z }
	}

	/// Three fresh single-variable expressions `(x0, x0+1, x0+2)`.
	pub fn from_vars(first: VarId) -> Self {
		LinVec3::new(
			LinExp::variable(first),
			LinExp::variable(first + 1),
			LinExp::variable(first + 2),
		)
	}

	pub fn evaluate(&self, vars: &[f64]) -> Vec3 {
		Vec3::new(self.x.evaluate(vars), self.y.evaluate(vars), self.z.evaluate(vars))
	}

	pub fn scale(mut self, k: f64) -> Self {
		self.x.scale(k);
		self.y.scale(k);
		self.z.scale(k);
		self
	}
}

impl Add for LinVec3 {
	type Output = LinVec3;
	fn add(self, rhs: LinVec3) -> LinVec3 {
		LinVec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
	}
}

impl Sub for LinVec3 {
	type Output = LinVec3;
	fn sub(self, rhs: LinVec3) -> LinVec3 {
		LinVec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
	}
}

impl Sub<Vec3> for LinVec3 {
	type Output = LinVec3;
	fn sub(self, rhs: Vec3) -> LinVec3 {
		LinVec3::new(self.x - LinExp::constant(rhs.x), self.y - LinExp::constant(rhs.y), self.z - LinExp::constant(rhs.z))
	}
}

impl Mul<f64> for LinVec3 {
	type Output = LinVec3;
	fn mul(self, k: f64) -> LinVec3 {
		self.scale(k)
	}
}

/// `eqA == eqB`, built as the residual `eqA - eqB`, per component.
pub fn eq3(a: LinVec3, b: LinVec3) -> LinVec3 {
	a - b
}

/// `eqA == constant`, per component.
pub fn eq3_const(a: LinVec3, b: Vec3) -> LinVec3 {
	a - b
}

/// Linear mix of two [`LinVec3`]s by a constant weight `t`.
pub fn mix3(a: LinVec3, b: LinVec3, t: f64) -> LinVec3 {
	a * (1.0 - t) + b * t
}

/// A vec2 of linear expressions (UV positions, block-grid indices).
#[derive(Debug, Clone, PartialEq)]
pub struct LinVec2 {
	pub x: LinExp,
	pub y: LinExp,
}

impl LinVec2 {
	pub fn new(x: LinExp, y: LinExp) -> Self {
		LinVec2 { x, y }
	}

	pub fn from_vars(first: VarId) -> Self {
		LinVec2::new(LinExp::variable(first), LinExp::variable(first + 1))
	}

	pub fn evaluate(&self, vars: &[f64]) -> Vec2 {
		Vec2::new(self.x.evaluate(vars), self.y.evaluate(vars))
	}
}

impl Sub for LinVec2 {
	type Output = LinVec2;
	fn sub(self, rhs: LinVec2) -> LinVec2 {
		LinVec2::new(self.x - rhs.x, self.y - rhs.y)
	}
}

/// `eqA == eqB`, built as the residual `eqA - eqB`, per component.
pub fn eq2(a: LinVec2, b: LinVec2) -> LinVec2 {
	a - b
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn invertible_single_term() {
		let e = LinExp::variable(3) * 2.0 + LinExp::constant(-12.0);
		assert!(e.is_invertible());
		assert_eq!(e.invert(), Some((3, 6.0)));
	}

	#[test]
	fn not_invertible_with_two_terms() {
		let e = LinExp::variable(0) + LinExp::variable(1);
		assert!(!e.is_invertible());
	}

	#[test]
	fn eq_builds_residual() {
		let r = eq(LinExp::variable(0), LinExp::constant(5.0));
		assert_eq!(r.evaluate(&[5.0]), 0.0);
		assert_eq!(r.evaluate(&[7.0]), 2.0);
	}

	#[test]
	fn evaluate_respects_terms_and_constant() {
		let e = LinExp::variable(0) * 3.0 + LinExp::variable(1) * 2.0 + LinExp::constant(-12.0);
		assert_eq!(e.evaluate(&[4.0, 0.0]), 0.0);
	}

	#[test]
	fn linvec3_mix_is_componentwise() {
		let a = LinVec3::from_vars(0);
		let b = LinVec3::from_vars(3);
		let m = mix3(a, b, 0.25);
		let vars = vec![0.0, 0.0, 0.0, 100.0, 100.0, 100.0];
		assert_eq!(m.evaluate(&vars), Vec3::new(25.0, 25.0, 25.0));
	}
}
