//! Seam-aware pixel and BC1 block solvers for making textured meshes
//! seamless before and after block compression.
//!
//! A texture painted onto a UV-mapped mesh is seamless when two points on
//! opposite sides of a shared 3D edge sample to the same color; lossy BC1
//! compression's independent per-block endpoint quantization re-introduces
//! visible seams even in an already-seamless texture. This crate builds
//! two sparse least-squares solvers -- one over per-pixel color variables,
//! one over per-block BC1 endpoint variables -- that enforce seam equality
//! while staying close to the source texture.
//!
//! # Pipeline
//! [`pipeline::run_pipeline`] drives the full mesh-plus-texture-in,
//! four-files-out workflow; [`pipeline::compress_and_optimize_texture`]
//! is the reusable core (encode, then iteratively solve/quantize/freeze).

#![deny(missing_docs)]

#[macro_use]
extern crate serde_derive;

/// Error and result types for the crate.
pub mod error;

/// 2D/3D vector primitives and bilinear-footprint math.
pub mod geom;

/// Best-fit line through an RGB point cloud (used by the BC1 encoder).
pub mod line;

/// Toroidal RGB image plus per-pixel mask.
pub mod image;

/// Mesh data model, seam extraction, and OBJ/MTL I/O.
pub mod mesh;

/// Sparse linear expression algebra over scalar solver variables.
pub mod linexpr;

/// Sparse least-squares equation set and solver.
pub mod lsq;

/// Seam-aware per-pixel solver.
pub mod solver;

/// BC1/DXT1 block encoder.
///
/// # Reference
/// - [DXT1 on Wikipedia](https://en.wikipedia.org/wiki/S3_Texture_Compression#DXT1)
/// - [BC1 on Microsoft Docs](https://docs.microsoft.com/en-us/windows/uwp/graphics-concepts/block-compression#bc1)
pub mod bc1;

/// File formats for block-compressed data (DDS).
pub mod format;

/// A grid of BC1 blocks, with reconstruction, error reporting and DDS output.
pub mod compressed_image;

/// Seam-aware solver over BC1 block endpoints.
pub mod compressed_solver;

/// Top-level orchestration of the solve-and-encode pipeline.
pub mod pipeline;

/// PNG read/write, feature-gated behind `png-io`.
#[cfg(feature = "png-io")]
pub mod png_io;
