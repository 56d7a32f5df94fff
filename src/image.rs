//! Toroidal RGB image plus a per-pixel mask bitset.
//!
//! Mirrors `original_source/src/image.{h,cpp}`'s `Image` class: `indexOf`
//! wraps negative/overflowing coordinates, `pixel(vec2)`/`fetch` do bilinear
//! sampling using the footprint math in [`crate::geom`], and
//! `setMaskInternal`/`setMaskSeam` rasterize a mesh's UVs into the mask.

use bitflags::bitflags;

use crate::geom::{bilinear_footprint, Vec2, Vec3};
use crate::mesh::Mesh;

bitflags! {
	/// Per-pixel mask bits.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
	pub struct MaskBit: u8 {
		/// Pixel lies inside some face's UV triangle.
		const INTERNAL = 0x1;
		/// Pixel lies on (or adjacent to, via bilinear footprint) a seam.
		const SEAM = 0x2;
	}
}

/// How many times finer than one texel the seam walk samples.
const SEAM_SAMPLING_FACTOR: f64 = 2.0;

/// A toroidally-addressed RGB image with a parallel mask buffer.
#[derive(Debug, Clone)]
pub struct Image {
	pub resx: i64,
	pub resy: i64,
	data: Vec<Vec3>,
	mask: Vec<MaskBit>,
}

impl Image {
	/// A black, unmasked image of the given size.
	pub fn new(resx: i64, resy: i64) -> Self {
		let n = (resx * resy).max(0) as usize;
		Image {
			resx,
			resy,
			data: vec![Vec3::zeros(); n],
			mask: vec![MaskBit::empty(); n],
		}
	}

	/// Wraps `(x, y)` into `[0, resx) x [0, resy)` and flattens to a data index.
	pub fn index_of(&self, x: i64, y: i64) -> usize {
		let x = x.rem_euclid(self.resx);
		let y = y.rem_euclid(self.resy);
		(y * self.resx + x) as usize
	}

	pub fn pixel(&self, x: i64, y: i64) -> Vec3 {
		self.data[self.index_of(x, y)]
	}

	pub fn set_pixel(&mut self, x: i64, y: i64, c: Vec3) {
		let i = self.index_of(x, y);
		self.data[i] = c;
	}

	pub fn mask(&self, x: i64, y: i64) -> MaskBit {
		self.mask[self.index_of(x, y)]
	}

	pub fn set_mask(&mut self, x: i64, y: i64, bits: MaskBit) {
		let i = self.index_of(x, y);
		self.mask[i] |= bits;
	}

	pub fn clear_mask(&mut self) {
		self.mask.iter_mut().for_each(|m| *m = MaskBit::empty());
	}

	/// Bilinear sample at continuous position `p`.
	pub fn sample(&self, p: Vec2) -> Vec3 {
		let ((x0, y0), (x1, y1), (w00, w10, w01, w11)) = bilinear_footprint(p);
		self.pixel(x0, y0) * w00 + self.pixel(x1, y0) * w10 + self.pixel(x0, y1) * w01 + self.pixel(x1, y1) * w11
	}

	/// The four texel coordinates and weights contributing to `sample(p)`.
	pub fn fetch_footprint(&self, p: Vec2) -> [((i64, i64), f64); 4] {
		let ((x0, y0), (x1, y1), (w00, w10, w01, w11)) = bilinear_footprint(p);
		[((x0, y0), w00), ((x1, y0), w10), ((x0, y1), w01), ((x1, y1), w11)]
	}

	/// Marks every pixel whose center lies inside some face's UV triangle.
	/// Returns the number of newly-marked pixels.
	pub fn set_mask_internal(&mut self, mesh: &Mesh) -> usize {
		let imgsz = Vec2::new(self.resx as f64, self.resy as f64);
		let mut newly_marked = 0;

		for face in &mesh.faces {
			if face.len() != 3 {
				// matches the original's "does not work with polygonal faces" caveat
				continue;
			}

			let mut minx = i64::MAX;
			let mut miny = i64::MAX;
			let mut maxx = i64::MIN;
			let mut maxy = i64::MIN;
			for &t in &face.ti {
				let tc = mesh.uvs[t].component_mul(&imgsz);
				minx = minx.min(tc.x as i64);
				miny = miny.min(tc.y as i64);
				maxx = maxx.max(tc.x as i64);
				maxy = maxy.max(tc.y as i64);
			}
			minx -= 1;
			miny -= 1;
			maxx += 1;
			maxy += 1;

			let e0 = face.edge2(0);
			let e1 = face.edge2(1);
			let e2 = face.edge2(2);
			let a0 = mesh.uvs[e0.0].component_mul(&imgsz);
			let b0 = mesh.uvs[e0.1].component_mul(&imgsz);
			let a1 = mesh.uvs[e1.0].component_mul(&imgsz);
			let b1 = mesh.uvs[e1.1].component_mul(&imgsz);
			let a2 = mesh.uvs[e2.0].component_mul(&imgsz);
			let b2 = mesh.uvs[e2.1].component_mul(&imgsz);

			for y in miny..=maxy {
				for x in minx..=maxx {
					let p = Vec2::new(x as f64, y as f64);
					let ins0 = is_inside(a0, b0, p);
					let ins1 = is_inside(a1, b1, p);
					let ins2 = is_inside(a2, b2, p);
					if ins0 == ins1 && ins1 == ins2 && !self.mask(x, y).contains(MaskBit::INTERNAL) {
						self.set_mask(x, y, MaskBit::INTERNAL);
						newly_marked += 1;
					}
				}
			}
		}

		newly_marked
	}

	/// Walks every seam pair and marks the bilinear footprint of both sides
	/// at `1/(2L)` steps, `L` the longer UV edge in pixels. Returns the
	/// number of newly-marked pixels.
	pub fn set_mask_seam(&mut self, mesh: &Mesh) -> usize {
		let imgsz = Vec2::new(self.resx as f64, self.resy as f64);
		let mut newly_marked = 0;

		for seam in &mesh.seams {
			let d = mesh.max_length(seam, imgsz).max(1e-9);
			let step = 1.0 / (SEAM_SAMPLING_FACTOR * d);

			let mut t = 0.0;
			while t <= 1.0 {
				let pa = mesh.uv_pos(seam.0, t).component_mul(&imgsz);
				let pb = mesh.uv_pos(seam.1, t).component_mul(&imgsz);
				for p in [pa, pb] {
					for (coord, _) in self.fetch_footprint(p) {
						if !self.mask(coord.0, coord.1).contains(MaskBit::SEAM) {
							self.set_mask(coord.0, coord.1, MaskBit::SEAM);
							newly_marked += 1;
						}
					}
				}
				t += step;
			}
		}

		newly_marked
	}
}

/// True when `p` lies in the "left" half-plane of the directed edge `l0 -> l1`.
fn is_inside(l0: Vec2, l1: Vec2, p: Vec2) -> bool {
	let l = l1 - l0;
	let n = Vec2::new(l.y, -l.x);
	(p - l0).dot(&n) >= 0.0
}
