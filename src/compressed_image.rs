//! BC1-block-grid container.
//!
//! Grounded in `original_source/src/compressed_image.{h,cpp}`: a row-major
//! grid of [`Block`]s, one per 4x4 tile, with reconstruction, per-block
//! error reporting, and DDS serialization.

use crate::bc1::{encode_block, quantize_and_pack, quantize_endpoint, Block, BlockEncodeOptions};
use crate::error::Result;
use crate::format::dds;
use crate::geom::Vec3;
use crate::image::{Image, MaskBit};

/// Per-block min/max/mean Euclidean error against a reference image, over
/// pixels passing the `Internal|Seam` mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockErrorData {
	pub block_index: usize,
	pub min_error: f64,
	pub max_error: f64,
	pub avg_error: f64,
}

/// A grid of `(W/4) x (H/4)` BC1 blocks in row-major order.
#[derive(Debug, Clone)]
pub struct CompressedImage {
	pub resx: i64,
	pub resy: i64,
	blocks: Vec<Block>,
}

impl CompressedImage {
	/// Encodes `img` into a fresh block grid, calling [`encode_block`] per
	/// tile with mask filter `mask_filter`.
	///
	/// # Panics
	/// Panics if `img`'s dimensions are not multiples of 4.
	pub fn encode(img: &Image, mask_filter: MaskBit, opts: BlockEncodeOptions) -> Self {
		assert_eq!(img.resx % 4, 0, "image width must be a multiple of 4");
		assert_eq!(img.resy % 4, 0, "image height must be a multiple of 4");

		let blocks_x = (img.resx / 4) as usize;
		let blocks_y = (img.resy / 4) as usize;

		let tile_at = |index: usize| {
			let bx = (index % blocks_x) as i64;
			let by = (index / blocks_x) as i64;
			let mut pixels = [Vec3::zeros(); 16];
			let mut mask = [MaskBit::empty(); 16];
			for h in 0..4i64 {
				for k in 0..4i64 {
					let x = 4 * bx + k;
					let y = 4 * by + h;
					pixels[(h * 4 + k) as usize] = img.pixel(x, y);
					mask[(h * 4 + k) as usize] = img.mask(x, y);
				}
			}
			encode_block(&pixels, &mask, mask_filter, opts)
		};

		// Per-block encoding reads disjoint pixel neighborhoods and writes
		// disjoint block slots, so it parallelizes trivially.
		#[cfg(feature = "parallel")]
		let blocks: Vec<Block> = {
			use rayon::prelude::*;
			(0..blocks_x * blocks_y).into_par_iter().map(tile_at).collect()
		};
		#[cfg(not(feature = "parallel"))]
		let blocks: Vec<Block> = (0..blocks_x * blocks_y).map(tile_at).collect();

		log::info!("encoded {}x{} blocks ({} total)", blocks_x, blocks_y, blocks.len());

		CompressedImage { resx: img.resx, resy: img.resy, blocks }
	}

	/// Number of blocks.
	pub fn nblk(&self) -> usize {
		self.blocks.len()
	}

	/// How many blocks wide the grid is.
	pub fn blocks_x(&self) -> i64 {
		self.resx / 4
	}

	fn block_index(&self, x: i64, y: i64) -> usize {
		let x = x.rem_euclid(self.resx);
		let y = y.rem_euclid(self.resy);
		((y / 4) * self.blocks_x() + (x / 4)) as usize
	}

	pub fn block(&self, index: usize) -> &Block {
		&self.blocks[index]
	}

	pub fn block_mut(&mut self, index: usize) -> &mut Block {
		&mut self.blocks[index]
	}

	pub fn block_at(&self, x: i64, y: i64) -> &Block {
		&self.blocks[self.block_index(x, y)]
	}

	/// The stored 2-bit palette code at `(x, y)` (toroidal).
	pub fn get_mask(&self, x: i64, y: i64) -> u8 {
		let blk = self.block_at(x, y);
		let x = x.rem_euclid(self.resx);
		let y = y.rem_euclid(self.resy);
		blk.indices[((y % 4) * 4 + (x % 4)) as usize]
	}

	/// Reconstructs the color at `(x, y)` from its block's endpoints and
	/// stored code.
	pub fn pixel(&self, x: i64, y: i64) -> Vec3 {
		let blk = self.block_at(x, y);
		let code = self.get_mask(x, y);
		crate::bc1::palette_color(blk.c0, blk.c1, code)
	}

	/// Overwrites one endpoint of a block in place.
	pub fn set_block_color(&mut self, bx: i64, by: i64, ci: u8, c: Vec3) {
		let index = (by * self.blocks_x() + bx) as usize;
		match ci {
			0 => self.blocks[index].c0 = c,
			1 => self.blocks[index].c1 = c,
			_ => panic!("block endpoint index must be 0 or 1, got {ci}"),
		}
	}

	/// Re-applies BC1 quantization to every block's current endpoints, in
	/// place. Each endpoint is rounded/packed/dequantized independently;
	/// unlike [`write_dds`](Self::write_dds), this never swaps `c0`/`c1`,
	/// since that would desync the block's already-assigned `indices` from
	/// its endpoint roles.
	pub fn quantize_blocks(&mut self) {
		for blk in &mut self.blocks {
			let (_, c0_dq) = quantize_endpoint(blk.c0);
			let (_, c1_dq) = quantize_endpoint(blk.c1);
			blk.c0 = c0_dq;
			blk.c1 = c1_dq;
		}
	}

	/// Per-block min/max/mean reconstruction error against `reference`,
	/// over pixels whose mask intersects `Internal|Seam`.
	pub fn per_block_error(&self, reference: &Image) -> Vec<BlockErrorData> {
		assert_eq!(self.resx, reference.resx);
		assert_eq!(self.resy, reference.resy);

		let filter = MaskBit::INTERNAL | MaskBit::SEAM;
		let blocks_x = self.blocks_x();
		let blocks_y = self.resy / 4;

		let mut out = Vec::with_capacity(self.blocks.len());
		for by in 0..blocks_y {
			for bx in 0..blocks_x {
				let block_index = (by * blocks_x + bx) as usize;
				let blk = &self.blocks[block_index];

				let mut min_error = f64::INFINITY;
				let mut max_error: f64 = 0.0;
				let mut total_error = 0.0;
				let mut n = 0;

				for h in 0..4i64 {
					for k in 0..4i64 {
						let x = 4 * bx + k;
						let y = 4 * by + h;
						if reference.mask(x, y).intersects(filter) {
							n += 1;
							let code = blk.indices[(h * 4 + k) as usize];
							let c = crate::bc1::palette_color(blk.c0, blk.c1, code);
							let dist = (c - reference.pixel(x, y)).norm();
							min_error = min_error.min(dist);
							max_error = max_error.max(dist);
							total_error += dist;
						}
					}
				}

				out.push(if n > 0 {
					BlockErrorData { block_index, min_error, max_error, avg_error: total_error / n as f64 }
				} else {
					BlockErrorData { block_index, min_error: 0.0, max_error: 0.0, avg_error: 0.0 }
				});
			}
		}
		out
	}

	/// Serializes to a DDS (BC1/DXT1) file.
	pub fn write_dds(&self, writer: &mut impl std::io::Write) -> Result<()> {
		let mut data = Vec::with_capacity(self.blocks.len() * 8);
		for blk in &self.blocks {
			let (packed, _, _) = quantize_and_pack(blk);
			data.extend_from_slice(&packed.c0_565.to_le_bytes());
			data.extend_from_slice(&packed.c1_565.to_le_bytes());
			data.extend_from_slice(&packed.indices.to_le_bytes());
		}
		dds::write_bc1(writer, self.resx as u32, self.resy as u32, &data)
	}
}
