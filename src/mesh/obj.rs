//! Minimal OBJ/MTL reader and writer.
//!
//! Grounded directly in `original_source/src/mesh_io.cpp`'s tokenizer and
//! face-index parser: comments and blank lines are skipped, tokens are
//! whitespace-split, and `f` tokens are `p/t[/n]` with a missing texture
//! index treated as a hard error.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::geom::{Vec2, Vec3};

use super::{Face, Material, Mesh};

fn is_whitespace(c: char) -> bool {
	c == ' ' || c == '\t' || c == '\r' || c == '\n'
}

fn tokenize_line(line: &str) -> Vec<String> {
	let trimmed = line.trim_end_matches(is_whitespace);
	if trimmed.is_empty() || trimmed.starts_with('#') {
		return Vec::new();
	}

	let mut tokens = Vec::new();
	let mut tok = String::new();
	for c in trimmed.chars() {
		if !is_whitespace(c) {
			tok.push(c);
		} else if !tok.is_empty() {
			tokens.push(std::mem::take(&mut tok));
		}
	}
	if !tok.is_empty() {
		tokens.push(tok);
	}
	tokens
}

/// Splits a `p/t/n` (or `p/t`, or `p`) face-vertex token on `/`.
fn parse_face_indices(token: &str) -> Vec<String> {
	token.split('/').map(|s| s.to_string()).collect()
}

fn parse_float(s: &str, line: &str) -> Result<f64> {
	s.parse::<f64>()
		.map_err(|_| Error::FormatError(format!("malformed number '{s}' in line '{line}'")))
}

fn parse_index(s: &str, line: &str) -> Result<usize> {
	let i: i64 = s
		.parse()
		.map_err(|_| Error::FormatError(format!("malformed index '{s}' in line '{line}'")))?;
	if i < 1 {
		return Err(Error::FormatError(format!("non-positive OBJ index in line '{line}'")));
	}
	Ok((i - 1) as usize)
}

fn read_face(tokens: &[String], line: &str) -> Result<Face> {
	if tokens.len() < 4 {
		return Err(Error::FormatError(format!("face with fewer than 3 vertices: '{line}'")));
	}

	let mut face = Face::default();
	for tok in &tokens[1..] {
		let parts = parse_face_indices(tok);
		if parts.is_empty() || parts[0].is_empty() {
			return Err(Error::FormatError(format!("empty vertex index in face '{line}'")));
		}
		face.pi.push(parse_index(&parts[0], line)?);

		match parts.get(1) {
			Some(t) if !t.is_empty() => face.ti.push(parse_index(t, line)?),
			_ => return Err(Error::FormatError(format!("no texture coordinate for vertex in face '{line}'"))),
		}
	}
	Ok(face)
}

/// Loads an OBJ file: `v`, `vt`, `f` (triangles or polygons), `usemtl`.
/// `vn` and `mtllib` are read and ignored, matching the original loader.
pub fn load_obj_file(path: impl AsRef<Path>) -> Result<Mesh> {
	let text = fs::read_to_string(path)?;

	let mut mesh = Mesh::new();
	let mut current_material: Option<usize> = None;
	let mut material_map: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
	let mut num_half_edges = 0usize;

	for line in text.lines() {
		let tokens = tokenize_line(line);
		if tokens.is_empty() {
			continue;
		}

		match tokens[0].as_str() {
			"v" => {
				if tokens.len() < 4 {
					return Err(Error::FormatError(format!("malformed 'v' line: '{line}'")));
				}
				mesh.positions.push(Vec3::new(
					parse_float(&tokens[1], line)?,
					parse_float(&tokens[2], line)?,
					parse_float(&tokens[3], line)?,
				));
			}
			"vt" => {
				if tokens.len() < 3 {
					return Err(Error::FormatError(format!("malformed 'vt' line: '{line}'")));
				}
				mesh.uvs.push(Vec2::new(parse_float(&tokens[1], line)?, parse_float(&tokens[2], line)?));
			}
			"f" => {
				let face = read_face(&tokens, line)?;
				num_half_edges += face.len();
				mesh.faces.push(face);
				mesh.face_material.push(current_material);
			}
			"vn" | "mtllib" => {
				// ignored, matching the original loader
			}
			"usemtl" => {
				let name = tokens.get(1).cloned().unwrap_or_default();
				current_material = Some(*material_map.entry(name.clone()).or_insert_with(|| {
					mesh.materials.push(Material::new(name));
					mesh.materials.len() - 1
				}));
			}
			other => {
				log::debug!("ignoring OBJ line starting with '{other}'");
			}
		}
	}

	log::info!("mesh has {num_half_edges} half-edges");

	Ok(mesh)
}

/// Writes `<stem>.obj` + `<stem>.mtl` referencing `texture_path`.
///
/// `mirror_v` flips the V coordinate on write, restoring the OBJ
/// bottom-left UV convention after the pipeline's internal top-left
/// convention.
pub fn save_obj_file(mesh: &Mesh, mesh_stem: impl AsRef<Path>, texture_path: &str, mirror_v: bool) -> Result<()> {
	let mesh_stem = mesh_stem.as_ref();
	let obj_path = mesh_stem.with_extension("obj");
	let mtl_path = mesh_stem.with_extension("mtl");
	let mtl_filename = mtl_path.file_name().unwrap().to_string_lossy().into_owned();

	let mut mtl = fs::File::create(&mtl_path)?;
	writeln!(mtl, "newmtl Material_0")?;
	writeln!(mtl, "Ka 1.0000 1.0000 1.0000")?;
	writeln!(mtl, "Kd 1.0000 1.0000 1.0000")?;
	writeln!(mtl, "Ks 0.0000 0.0000 0.0000")?;
	writeln!(mtl, "d 1")?;
	writeln!(mtl, "Ns 0.0000")?;
	writeln!(mtl, "illum 1")?;
	writeln!(mtl, "map_Kd {texture_path}")?;

	let mut obj = fs::File::create(&obj_path)?;
	writeln!(obj, "mtllib ./{mtl_filename}")?;
	for v in &mesh.positions {
		writeln!(obj, "v {} {} {}", v.x, v.y, v.z)?;
	}
	for vt in &mesh.uvs {
		let y = if mirror_v { 1.0 - vt.y } else { vt.y };
		writeln!(obj, "vt {} {y}", vt.x)?;
	}
	writeln!(obj, "usemtl  Material_0")?;
	for face in &mesh.faces {
		write!(obj, "f")?;
		for i in 0..face.len() {
			write!(obj, " {}/{}", face.pi[i] + 1, face.ti[i] + 1)?;
		}
		writeln!(obj)?;
	}

	Ok(())
}
