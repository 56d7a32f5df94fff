//! DDS (DirectDraw Surface) header read/write, specialized for uncompressed
//! BC1/DXT1 output.
//!
//! # Reference
//! See:
//! - [Microsoft Docs sample loader](https://docs.microsoft.com/en-us/windows/uwp/gaming/complete-code-for-ddstextureloader)
//! - [MSDN DDS Programming Guide](https://msdn.microsoft.com/library/windows/desktop/bb943991)

use std::io::{self, Read, Write};
use std::mem;

use crate::error::{Error, Result};

const MAGIC: [u8; 4] = *b"DDS ";
const HEADER_SIZE: u32 = 124;
const PIXEL_FORMAT_SIZE: u32 = 32;
const FOURCC_DXT1: [u8; 4] = *b"DXT1";

bitflags::bitflags! {
	#[derive(Serialize, Deserialize)]
	struct HeaderFlags: u32 {
		const CAPS = 0x1;
		const HEIGHT = 0x2;
		const WIDTH = 0x4;
		const PIXEL_FORMAT = 0x1000;
	}
}

bitflags::bitflags! {
	#[derive(Serialize, Deserialize)]
	struct PixelFormatFlags: u32 {
		const FOURCC = 0x4;
	}
}

bitflags::bitflags! {
	#[derive(Serialize, Deserialize)]
	struct Capabilities: u32 {
		const TEXTURE = 0x1000;
	}
}

#[repr(C)]
#[derive(Serialize, Deserialize)]
struct PixelFormat {
	size: u32,
	flags: PixelFormatFlags,
	four_cc: [u8; 4],
	rgb_bit_count: u32,
	red_mask: u32,
	green_mask: u32,
	blue_mask: u32,
	alpha_mask: u32,
}

#[repr(C)]
#[derive(Serialize, Deserialize)]
struct Header {
	size: u32,
	flags: HeaderFlags,
	height: u32,
	width: u32,
	pitch_or_linear_size: u32,
	depth: u32,
	mipmap_count: u32,
	reserved: [u32; 11],
	format: PixelFormat,
	caps: Capabilities,
	caps2: u32,
	caps3: u32,
	caps4: u32,
	reserved2: u32,
}

fn bc1_header(width: u32, height: u32) -> Header {
	Header {
		size: HEADER_SIZE,
		flags: HeaderFlags::CAPS | HeaderFlags::HEIGHT | HeaderFlags::WIDTH | HeaderFlags::PIXEL_FORMAT,
		height,
		width,
		pitch_or_linear_size: 0,
		depth: 0,
		mipmap_count: 1,
		reserved: [0; 11],
		format: PixelFormat {
			size: PIXEL_FORMAT_SIZE,
			flags: PixelFormatFlags::FOURCC,
			four_cc: FOURCC_DXT1,
			rgb_bit_count: 0,
			red_mask: 0,
			green_mask: 0,
			blue_mask: 0,
			alpha_mask: 0,
		},
		caps: Capabilities::TEXTURE,
		caps2: 0,
		caps3: 0,
		caps4: 0,
		reserved2: 0,
	}
}

/// Writes a BC1/DXT1 DDS file: magic, header, then `block_data` verbatim
/// (already packed `(c0: u16, c1: u16, indices: u32)` triples, row-major by
/// block; see [`crate::bc1::PackedBlock`]).
pub fn write_bc1(writer: &mut impl Write, width: u32, height: u32, block_data: &[u8]) -> Result<()> {
	writer.write_all(&MAGIC)?;

	let header = bc1_header(width, height);
	bincode::serialize_into(&mut *writer, &header)?;

	writer.write_all(block_data)?;
	Ok(())
}

/// Reads a DDS file's header far enough to validate it, matching the
/// original loader's scope (no pixel-format branching, BC1/DXT1 only).
/// Kept as reference machinery: the pipeline only ever writes DDS files, it
/// never needs to round-trip one back in.
pub fn read(reader: &mut impl Read) -> Result<()> {
	let mut magic_number = [0u8; 4];
	reader.read_exact(&mut magic_number)?;

	if magic_number != MAGIC {
		return Err(Error::FormatError("DDS magic number not found".to_string()));
	}

	let header: Header = bincode::deserialize_from(reader)
		.map_err(|e| Error::FormatError(format!("malformed DDS header: {e}")))?;

	if header.size != HEADER_SIZE {
		return Err(Error::FormatError(format!(
			"header size mismatch: expected {HEADER_SIZE} bytes, found {}",
			header.size
		)));
	}

	if header.format.size != PIXEL_FORMAT_SIZE {
		return Err(Error::FormatError(format!(
			"pixel format size mismatch: expected {PIXEL_FORMAT_SIZE} bytes, found {}",
			header.format.size
		)));
	}

	if header.format.four_cc != FOURCC_DXT1 {
		return Err(Error::FormatError("only DXT1/BC1 DDS files are supported".to_string()));
	}

	let _ = mem::size_of::<Header>();
	Ok(())
}
