//! PNG read/write for [`Image`], feature-gated behind `png-io`.
//!
//! Grounded in the teacher's own `image` crate usage; alpha is ignored on
//! load (the pipeline only ever deals in RGB) and written fully opaque on
//! save.

use image::{ImageBuffer, Rgba};

use crate::error::{Error, Result};
use crate::geom::Vec3;
use crate::image::Image;

/// Loads an 8-bit RGBA PNG into an [`Image`], dropping the alpha channel.
pub fn load_png(path: &std::path::Path) -> Result<Image> {
	let img = image::open(path).map_err(|e| Error::FormatError(format!("failed to read {}: {e}", path.display())))?;
	let rgba = img.to_rgba8();
	let (w, h) = rgba.dimensions();

	let mut out = Image::new(w as i64, h as i64);
	for y in 0..h {
		for x in 0..w {
			let p = rgba.get_pixel(x, y);
			out.set_pixel(x as i64, y as i64, Vec3::new(p[0] as f64, p[1] as f64, p[2] as f64));
		}
	}

	log::info!("loaded {}x{} PNG from {}", w, h, path.display());
	Ok(out)
}

/// Writes `img` as an 8-bit RGBA PNG, with alpha forced to fully opaque.
pub fn save_png(img: &Image, path: &std::path::Path) -> Result<()> {
	let w = img.resx as u32;
	let h = img.resy as u32;

	let mut buf: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(w, h);
	for y in 0..h {
		for x in 0..w {
			let c = img.pixel(x as i64, y as i64);
			let r = c.x.round().clamp(0.0, 255.0) as u8;
			let g = c.y.round().clamp(0.0, 255.0) as u8;
			let b = c.z.round().clamp(0.0, 255.0) as u8;
			buf.put_pixel(x, y, Rgba([r, g, b, 255]));
		}
	}

	buf.save(path).map_err(|e| Error::FormatError(format!("failed to write {}: {e}", path.display())))?;
	log::info!("wrote {}x{} PNG to {}", w, h, path.display());
	Ok(())
}
