//! Top-level orchestration: seamless solve, compressed seam solve with
//! outer block-freezing iteration, and the four-output file pipeline.
//!
//! Grounded in `original_source/src/main.cpp`'s `compressAndOptimzeTexture`
//! and its three output blocks.

use std::collections::BTreeSet;
use std::path::Path;

use crate::bc1::BlockEncodeOptions;
use crate::compressed_image::CompressedImage;
use crate::compressed_solver::SolverCompressedImage;
use crate::error::Result;
use crate::image::{Image, MaskBit};
use crate::mesh::Mesh;
use crate::solver::Solver;

/// Encodes `texture` into a [`CompressedImage`], then repeatedly re-solves
/// and re-quantizes, freezing the lowest-error `ceil(1% of blocks)` block
/// indices each round, until no new block is frozen or `max_iter` rounds
/// have run.
pub fn compress_and_optimize_texture(mesh: &Mesh, texture: &Image, max_iter: usize) -> Result<CompressedImage> {
	let mut cimg = CompressedImage::encode(texture, MaskBit::SEAM | MaskBit::INTERNAL, BlockEncodeOptions::default());
	cimg.quantize_blocks();

	let mut frozen = BTreeSet::new();
	let mut n = 0;

	loop {
		let mut solver = SolverCompressedImage::new();
		solver.fix_seams(mesh, texture, &mut cimg, &frozen)?;
		cimg.quantize_blocks();
		n += 1;

		if n >= max_iter {
			break;
		}

		let mut errs = cimg.per_block_error(texture);
		errs.sort_by(|a, b| a.avg_error.partial_cmp(&b.avg_error).unwrap());

		let limit = ((errs.len() as f64) * 0.01).ceil().max(1.0) as usize;
		let mut num_inserted = 0;
		for e in &errs {
			if frozen.insert(e.block_index) {
				num_inserted += 1;
			}
			if num_inserted > limit {
				break;
			}
		}

		if num_inserted == 0 {
			break;
		}
	}

	Ok(cimg)
}

/// Runs the full CLI pipeline against an OBJ mesh and a source texture,
/// writing the four stem-prefixed outputs, with `stem` taken from
/// `obj_path`'s file stem.
#[cfg(feature = "png-io")]
pub fn run_pipeline(obj_path: &Path, texture_path: &Path) -> Result<()> {
	use crate::mesh::obj::{load_obj_file, save_obj_file};
	use crate::png_io::{load_png, save_png};

	let stem = obj_path
		.file_stem()
		.map(|s| s.to_string_lossy().into_owned())
		.unwrap_or_else(|| "texture".to_string());
	let out_dir = obj_path.parent().unwrap_or_else(|| Path::new("."));

	log::info!("loading mesh from {}", obj_path.display());
	let mut mesh = load_obj_file(obj_path)?;

	log::info!("computing seams");
	mesh.compute_seams();
	mesh.mirror_v();

	log::info!("loading texture from {}", texture_path.display());
	let mut img = load_png(texture_path)?;

	let ni = img.set_mask_internal(&mesh);
	let ns = img.set_mask_seam(&mesh);
	log::info!("{ni} internal pixels, {ns} seam pixels");

	// -- seamless -------------------------------------------------------
	let mut img_seamless = img.clone();
	Solver::new().fix_seams(&mesh, &mut img_seamless)?;

	let s_texture_name = format!("{stem}_s.png");
	let s_mesh_stem = out_dir.join(format!("{stem}_s"));
	save_png(&img_seamless, &out_dir.join(&s_texture_name))?;
	save_obj_file(&mesh, &s_mesh_stem, &s_texture_name, true)?;

	// -- seamless seam-aware compression, 1 iteration --------------------
	let cimg_seamless = compress_and_optimize_texture(&mesh, &img_seamless, 1)?;
	let sc_seamless_png = format!("{stem}_sc_seamless.png");
	write_compressed_outputs(&cimg_seamless, out_dir, &format!("{stem}_sc_seamless"), &sc_seamless_png)?;
	save_obj_file(&mesh, &out_dir.join(format!("{stem}_sc_seamless")), &sc_seamless_png, true)?;

	// -- seamless compressed, no seam solve -------------------------------
	let mut cimg_naive = CompressedImage::encode(&img_seamless, MaskBit::INTERNAL | MaskBit::SEAM, BlockEncodeOptions::default());
	cimg_naive.quantize_blocks();
	let sc_png = format!("{stem}_sc.png");
	write_compressed_outputs(&cimg_naive, out_dir, &format!("{stem}_sc"), &sc_png)?;
	save_obj_file(&mesh, &out_dir.join(format!("{stem}_sc")), &sc_png, true)?;

	Ok(())
}

#[cfg(feature = "png-io")]
fn write_compressed_outputs(cimg: &CompressedImage, out_dir: &Path, stem: &str, png_name: &str) -> Result<()> {
	use crate::png_io::save_png;

	let mut uncompressed = Image::new(cimg.resx, cimg.resy);
	for y in 0..cimg.resy {
		for x in 0..cimg.resx {
			uncompressed.set_pixel(x, y, cimg.pixel(x, y));
		}
	}
	save_png(&uncompressed, &out_dir.join(png_name))?;

	let dds_path = out_dir.join(format!("{stem}.dds"));
	let mut f = std::fs::File::create(dds_path)?;
	cimg.write_dds(&mut f)
}
