//! Mesh data model and seam extraction.

pub mod obj;

use std::collections::{BTreeMap, BTreeSet};

use crate::geom::{mix2, Vec2, Vec3};

/// An edge, as a pair of indices into whichever vector it refers to
/// (position indices for a 3D edge, UV indices for a UV edge).
pub type Edge = (usize, usize);

/// A pair of UV edges whose underlying 3D edges coincide.
pub type Seam = (Edge, Edge);

/// A face: parallel position-index and UV-index lists (triangles in
/// practice, but indexed generically so n-gons work too).
#[derive(Debug, Clone, Default)]
pub struct Face {
	/// Indices into [`Mesh::positions`].
	pub pi: Vec<usize>,
	/// Indices into [`Mesh::uvs`].
	pub ti: Vec<usize>,
}

impl Face {
	/// The `i`-th 3D edge of the face, wrapping around.
	pub fn edge3(&self, i: usize) -> Edge {
		(self.pi[i], self.pi[(i + 1) % self.pi.len()])
	}

	/// The `i`-th UV edge of the face, wrapping around.
	pub fn edge2(&self, i: usize) -> Edge {
		(self.ti[i], self.ti[(i + 1) % self.ti.len()])
	}

	/// Number of edges (== number of vertices) in the face.
	pub fn len(&self) -> usize {
		self.pi.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pi.is_empty()
	}
}

/// A named material; `texture` is `None` when the material has no map.
#[derive(Debug, Clone)]
pub struct Material {
	pub name: String,
	pub texture: Option<String>,
}

impl Material {
	pub fn new(name: impl Into<String>) -> Self {
		Material { name: name.into(), texture: None }
	}
}

/// Triangle mesh with UVs, seam pairing and (optional) materials.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
	pub positions: Vec<Vec3>,
	pub uvs: Vec<Vec2>,
	pub faces: Vec<Face>,
	pub seams: Vec<Seam>,
	/// Material index per face, parallel to `faces`; `None` if unassigned.
	pub face_material: Vec<Option<usize>>,
	pub materials: Vec<Material>,
}

impl Mesh {
	pub fn new() -> Self {
		Mesh::default()
	}

	/// Detects seams: for every 3D edge shared by >=2 distinct UV edges,
	/// pairs the first two.
	///
	/// Edge orientation is canonicalized by sorting the 3D edge's position
	/// indices ascending; the UV edge's endpoints are swapped in lockstep
	/// so the seam's two UV edges still refer to the same pair of 3D
	/// positions in the same order.
	pub fn compute_seams(&mut self) {
		let mut edge_map: BTreeMap<Edge, BTreeSet<Edge>> = BTreeMap::new();

		for face in &self.faces {
			for i in 0..face.len() {
				let mut e3 = face.edge3(i);
				let mut e2 = face.edge2(i);
				if e3.0 > e3.1 {
					e3 = (e3.1, e3.0);
					e2 = (e2.1, e2.0);
				}
				edge_map.entry(e3).or_default().insert(e2);
			}
		}

		self.seams.clear();
		for uv_edges in edge_map.values() {
			if uv_edges.len() > 1 {
				let mut it = uv_edges.iter();
				let e1 = *it.next().unwrap();
				let e2 = *it.next().unwrap();
				self.seams.push((e1, e2));
			}
		}

		log::info!("found {} seams", self.seams.len());
	}

	/// Flips the V coordinate of every UV.
	pub fn mirror_v(&mut self) {
		for uv in &mut self.uvs {
			uv.y = 1.0 - uv.y;
		}
	}

	/// UV-space edge length, scaled to pixel space by `sz`.
	pub fn length_uv(&self, e: Edge, sz: Vec2) -> f64 {
		let a = self.uvs[e.0].component_mul(&sz);
		let b = self.uvs[e.1].component_mul(&sz);
		(a - b).norm()
	}

	/// The longer of a seam's two UV edges, in pixel units.
	pub fn max_length(&self, s: &Seam, sz: Vec2) -> f64 {
		self.length_uv(s.0, sz).max(self.length_uv(s.1, sz))
	}

	/// The UV position at parameter `t` along edge `e`.
	pub fn uv_pos(&self, e: Edge, t: f64) -> Vec2 {
		mix2(self.uvs[e.0], self.uvs[e.1], t)
	}
}
