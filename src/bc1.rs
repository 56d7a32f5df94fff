//! BC1/DXT1 block encoder.
//!
//! The Block-Compression 1 algorithm (also known as DXT1) is a fixed
//! block-size texture compression algorithm.
//!
//! **Input data**: uncompressed RGB image (only a 1-bit alpha is supported
//! in the format proper; this crate does not carry an alpha channel).
//! **Output data**: compressed blocks, 8 bytes each, each covering a 4x4
//! pixel area: two RGB565 endpoints plus sixteen 2-bit palette indices.
//!
//! A block represents a line in RGB space (`c0`/`c1` the endpoints); the
//! palette linearly interpolates between them, which is why higher-quality
//! formats like BC7 exist for content where banding matters.

use nalgebra::{Matrix2, Vector2};

use crate::geom::{clamp3, Vec3};
use crate::image::MaskBit;
use crate::line::fit_line;

/// Palette weight pairs `(w0, w1)` for codes 0..3, in the order the encoder
/// assigns them: `c0, c1, 2/3 c0 + 1/3 c1, 1/3 c0 + 2/3 c1`.
pub const PALETTE_WEIGHTS: [(f64, f64); 4] = [(1.0, 0.0), (0.0, 1.0), (2.0 / 3.0, 1.0 / 3.0), (1.0 / 3.0, 2.0 / 3.0)];

/// Reconstructs the palette color for `code` given a block's two endpoints.
pub fn palette_color(c0: Vec3, c1: Vec3, code: u8) -> Vec3 {
	let (w0, w1) = PALETTE_WEIGHTS[code as usize];
	c0 * w0 + c1 * w1
}

/// Options controlling the BC1 encoder's endpoint-refinement behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockEncodeOptions {
	/// When true, re-assigns indices and re-refines endpoints in a loop
	/// until the squared error stops improving. The shipped/default
	/// behavior (`iterative: false`) is a single refinement pass.
	pub iterative: bool,
}

/// An uncompressed working-form BC1 block: two continuous RGB endpoints
/// plus 16 per-pixel 2-bit palette codes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
	pub c0: Vec3,
	pub c1: Vec3,
	pub indices: [u8; 16],
}

impl Block {
	/// Reconstructs the color at `(row, col)` within the block (0..4 each).
	pub fn pixel(&self, row: usize, col: usize) -> Vec3 {
		palette_color(self.c0, self.c1, self.indices[row * 4 + col])
	}
}

fn assign_indices(pixels: &[Vec3; 16], c0: Vec3, c1: Vec3) -> [u8; 16] {
	let mut indices = [0u8; 16];
	for (i, p) in pixels.iter().enumerate() {
		let mut best_code = 0u8;
		let mut best_dist = f64::INFINITY;
		for code in 0u8..4 {
			let candidate = palette_color(c0, c1, code);
			let dist = (candidate - p).norm_squared();
			if dist < best_dist {
				best_dist = dist;
				best_code = code;
			}
		}
		indices[i] = best_code;
	}
	indices
}

fn refine_endpoints(pixels: &[Vec3; 16], selected: &[usize], indices: &[u8; 16], c0: Vec3, c1: Vec3) -> (Vec3, Vec3) {
	if selected.len() <= 2 {
		return (c0, c1);
	}

	let mut ata = Matrix2::<f64>::zeros();
	let mut atb = [Vector2::<f64>::zeros(); 3];

	for &i in selected {
		let (w0, w1) = PALETTE_WEIGHTS[indices[i] as usize];
		let row = Vector2::new(w0, w1);
		ata += row * row.transpose();
		let p = pixels[i];
		for (ch, atb_ch) in atb.iter_mut().enumerate() {
			*atb_ch += row * p[ch];
		}
	}

	let lu = ata.lu();
	let mut new_c0 = [0.0; 3];
	let mut new_c1 = [0.0; 3];
	for (ch, b) in atb.iter().enumerate() {
		match lu.solve(b) {
			Some(x) => {
				new_c0[ch] = x[0];
				new_c1[ch] = x[1];
			}
			None => return (c0, c1),
		}
	}

	(
		clamp3(Vec3::new(new_c0[0], new_c0[1], new_c0[2]), 0.0, 255.0),
		clamp3(Vec3::new(new_c1[0], new_c1[1], new_c1[2]), 0.0, 255.0),
	)
}

/// Encodes a 4x4 tile of pixels into a BC1 working-form [`Block`].
/// `mask_filter` of [`MaskBit::empty()`] means "all pixels qualify";
/// otherwise only pixels whose mask intersects `mask_filter` are used to
/// fit the line and refine the endpoints (index assignment always runs
/// over the full 16-pixel tile).
///
/// The shipped behavior is a single refinement pass: indices are assigned
/// once against the initial endpoints and kept as-is after refinement.
/// Setting `opts.iterative` instead re-assigns indices each round and
/// keeps refining as long as the tile's squared error keeps dropping.
pub fn encode_block(pixels: &[Vec3; 16], pixel_mask: &[MaskBit; 16], mask_filter: MaskBit, opts: BlockEncodeOptions) -> Block {
	let selected: Vec<usize> = if mask_filter.is_empty() {
		(0..16).collect()
	} else {
		(0..16).filter(|&i| pixel_mask[i].intersects(mask_filter)).collect()
	};

	let select_points: Vec<Vec3> = if selected.is_empty() {
		vec![Vec3::zeros()]
	} else {
		selected.iter().map(|&i| pixels[i]).collect()
	};

	let line = fit_line(&select_points);

	let ts: Vec<f64> = select_points.iter().map(|p| (p - line.o).dot(&line.d)).collect();
	let tmin = ts.iter().copied().fold(0.0, f64::min);
	let tmax = ts.iter().copied().fold(0.0, f64::max);

	let mut c0 = clamp3(line.at(tmin), 0.0, 255.0);
	let mut c1 = clamp3(line.at(tmax), 0.0, 255.0);

	let mut indices = assign_indices(pixels, c0, c1);

	if !opts.iterative {
		let (r0, r1) = refine_endpoints(pixels, &selected, &indices, c0, c1);
		return Block { c0: r0, c1: r1, indices };
	}

	loop {
		let (r0, r1) = refine_endpoints(pixels, &selected, &indices, c0, c1);
		let new_indices = assign_indices(pixels, r0, r1);

		let before = tile_squared_error(pixels, c0, c1, &indices);
		let after = tile_squared_error(pixels, r0, r1, &new_indices);
		if after >= before {
			break;
		}
		c0 = r0;
		c1 = r1;
		indices = new_indices;
	}

	Block { c0, c1, indices }
}

fn tile_squared_error(pixels: &[Vec3; 16], c0: Vec3, c1: Vec3, indices: &[u8; 16]) -> f64 {
	pixels.iter().zip(indices.iter()).map(|(p, &code)| (palette_color(c0, c1, code) - p).norm_squared()).sum()
}

/// Rounds a continuous RGB endpoint to 8-bit, packs it to RGB565, and
/// dequantizes it back into a continuous color.
pub fn quantize_endpoint(c: Vec3) -> (u16, Vec3) {
	let r8 = c.x.round().clamp(0.0, 255.0) as u32;
	let g8 = c.y.round().clamp(0.0, 255.0) as u32;
	let b8 = c.z.round().clamp(0.0, 255.0) as u32;

	let r5 = r8 >> 3;
	let g6 = g8 >> 2;
	let b5 = b8 >> 3;
	let packed = ((r5 << 11) | (g6 << 5) | b5) as u16;

	const RB: f64 = 255.0 / 31.0;
	const G: f64 = 255.0 / 63.0;
	let dequant = Vec3::new(r5 as f64 * RB, g6 as f64 * G, b5 as f64 * RB);

	(packed, dequant)
}

/// A block in its on-disk, quantized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedBlock {
	pub c0_565: u16,
	pub c1_565: u16,
	pub indices: u32,
}

/// Packs 16 2-bit codes into the 32-bit index field, pixel 0 in the
/// least-significant pair, row-major.
pub fn pack_indices(indices: &[u8; 16]) -> u32 {
	let mut packed = 0u32;
	for (i, &code) in indices.iter().enumerate() {
		packed |= (code as u32) << (2 * i);
	}
	packed
}

/// Unpacks a 32-bit index field into 16 2-bit codes.
pub fn unpack_indices(packed: u32) -> [u8; 16] {
	let mut indices = [0u8; 16];
	for (i, idx) in indices.iter_mut().enumerate() {
		*idx = ((packed >> (2 * i)) & 0b11) as u8;
	}
	indices
}

/// Swaps `0<->1` and `2<->3`.
fn swap_code(code: u8) -> u8 {
	match code {
		0 => 1,
		1 => 0,
		2 => 3,
		3 => 2,
		_ => unreachable!("BC1 palette codes are always in 0..4"),
	}
}

/// Quantizes and packs a working-form [`Block`]: rounds/packs each endpoint
/// to RGB565, then swaps `c0`/`c1` and remaps indices if `c0_565 < c1_565`
/// so the opaque (four-color) palette encoding is always chosen. Returns
/// the packed block plus the dequantized endpoints actually used.
pub fn quantize_and_pack(block: &Block) -> (PackedBlock, Vec3, Vec3) {
	let (mut c0_565, mut c0_dq) = quantize_endpoint(block.c0);
	let (mut c1_565, mut c1_dq) = quantize_endpoint(block.c1);
	let mut indices = block.indices;

	if c0_565 < c1_565 {
		std::mem::swap(&mut c0_565, &mut c1_565);
		std::mem::swap(&mut c0_dq, &mut c1_dq);
		for code in indices.iter_mut() {
			*code = swap_code(*code);
		}
	}

	if c0_565 == c1_565 {
		indices = [0u8; 16];
	}

	(
		PackedBlock { c0_565, c1_565, indices: pack_indices(&indices) },
		c0_dq,
		c1_dq,
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn uniform_tile(c: Vec3) -> [Vec3; 16] {
		[c; 16]
	}

	#[test]
	fn uniform_block_packs_to_equal_endpoints_and_zero_indices() {
		let pixels = uniform_tile(Vec3::new(128.0, 64.0, 32.0));
		let mask = [MaskBit::INTERNAL; 16];
		let block = encode_block(&pixels, &mask, MaskBit::INTERNAL, BlockEncodeOptions::default());
		let (packed, _, _) = quantize_and_pack(&block);
		assert_eq!(packed.c0_565, packed.c1_565);
		assert_eq!(packed.indices, 0);
	}

	#[test]
	fn two_color_gradient_uses_only_endpoint_codes() {
		let mut pixels = [Vec3::zeros(); 16];
		for (i, p) in pixels.iter_mut().enumerate() {
			*p = if i < 8 { Vec3::new(255.0, 0.0, 0.0) } else { Vec3::new(0.0, 0.0, 255.0) };
		}
		let mask = [MaskBit::INTERNAL; 16];
		let block = encode_block(&pixels, &mask, MaskBit::empty(), BlockEncodeOptions::default());
		for &code in &block.indices {
			assert!(code == 0 || code == 1, "expected only endpoint codes, got {code}");
		}
	}

	#[test]
	fn index_swap_is_involution() {
		for code in 0u8..4 {
			assert_eq!(swap_code(swap_code(code)), code);
		}
	}

	#[test]
	fn pack_unpack_round_trips() {
		let indices: [u8; 16] = [0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2, 3];
		let packed = pack_indices(&indices);
		assert_eq!(unpack_indices(packed), indices);
	}

	#[test]
	fn empty_selection_falls_back_to_black() {
		let pixels = uniform_tile(Vec3::new(10.0, 20.0, 30.0));
		let mask = [MaskBit::empty(); 16];
		// mask_filter requires SEAM but no pixel has it: selection is empty.
		let block = encode_block(&pixels, &mask, MaskBit::SEAM, BlockEncodeOptions::default());
		// line fit falls back to the origin (0,0,0) per the "treat S as {(0,0,0)}" rule.
		assert_eq!(block.c0, Vec3::zeros());
	}

	#[test]
	fn quantized_endpoint_ordering_invariant_holds() {
		let pixels = uniform_tile(Vec3::new(10.0, 200.0, 5.0));
		let mask = [MaskBit::INTERNAL; 16];
		let block = encode_block(&pixels, &mask, MaskBit::empty(), BlockEncodeOptions::default());
		let (packed, _, _) = quantize_and_pack(&block);
		assert!(packed.c0_565 >= packed.c1_565);
		if packed.c0_565 == packed.c1_565 {
			assert_eq!(packed.indices, 0);
		}
	}
}
