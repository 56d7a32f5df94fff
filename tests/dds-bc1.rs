use std::io::Cursor;

use seamtex::bc1::{encode_block, BlockEncodeOptions, PackedBlock};
use seamtex::format::dds;
use seamtex::geom::Vec3;
use seamtex::image::MaskBit;

#[test]
fn write_bc1_round_trips_header_for_a_single_block() {
	let pixels = [Vec3::new(10.0, 20.0, 30.0); 16];
	let mask = [MaskBit::empty(); 16];
	let block = encode_block(&pixels, &mask, MaskBit::empty(), BlockEncodeOptions::default());
	let (packed, _, _) = seamtex::bc1::quantize_and_pack(&block);

	let mut data = Vec::new();
	data.extend_from_slice(&packed.c0_565.to_le_bytes());
	data.extend_from_slice(&packed.c1_565.to_le_bytes());
	data.extend_from_slice(&packed.indices.to_le_bytes());

	let mut buf = Vec::new();
	dds::write_bc1(&mut buf, 4, 4, &data).unwrap();

	assert_eq!(buf.len(), 4 + 124 + 8);
	assert_eq!(&buf[0..4], b"DDS ");

	let mut cursor = Cursor::new(buf);
	assert!(dds::read(&mut cursor).is_ok());
}

#[test]
fn write_bc1_rejects_on_read_with_bad_magic() {
	let mut cursor = Cursor::new(b"nope!!!!".to_vec());
	assert!(dds::read(&mut cursor).is_err());
}

#[test]
fn all_black_4x4_image_has_a_zeroed_block_and_dxt1_fourcc() {
	let pixels = [Vec3::new(0.0, 0.0, 0.0); 16];
	let mask = [MaskBit::empty(); 16];
	let block = encode_block(&pixels, &mask, MaskBit::empty(), BlockEncodeOptions::default());
	let (packed, _, _): (PackedBlock, _, _) = seamtex::bc1::quantize_and_pack(&block);

	assert_eq!(packed.c0_565, 0);
	assert_eq!(packed.c1_565, 0);
	assert_eq!(packed.indices, 0);

	let mut data = Vec::new();
	data.extend_from_slice(&packed.c0_565.to_le_bytes());
	data.extend_from_slice(&packed.c1_565.to_le_bytes());
	data.extend_from_slice(&packed.indices.to_le_bytes());

	let mut buf = Vec::new();
	dds::write_bc1(&mut buf, 4, 4, &data).unwrap();

	// 4 magic + 124 header + 8 block bytes.
	assert_eq!(buf.len(), 136);
	assert_eq!(&buf[buf.len() - 8..], &[0u8; 8]);
}
