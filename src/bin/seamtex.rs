//! CLI driver for the seamless-texture pipeline.
//!
//! `seamtex <obj-path> <texture-path> [-c]` loads a mesh and its texture,
//! runs the seamless and compressed-seam solves, and writes the four
//! stem-prefixed outputs.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "seamtex", about = "Make a textured mesh seamless, before and after BC1 compression")]
struct Args {
	/// Path to the input OBJ mesh.
	obj_path: PathBuf,
	/// Path to the input texture (PNG).
	texture_path: PathBuf,
	/// Accepted for compatibility with the original tool; currently unused.
	#[arg(short = 'c')]
	compressed_only: bool,
}

fn main() -> ExitCode {
	env_logger::init();

	let args = match Args::try_parse() {
		Ok(args) => args,
		Err(_) => {
			eprintln!("Usage: seamtex <obj-path> <texture-path> [-c]");
			return ExitCode::FAILURE;
		}
	};

	if args.compressed_only {
		log::debug!("-c was passed; the pipeline runs unconditionally regardless");
	}

	match seamtex::pipeline::run_pipeline(&args.obj_path, &args.texture_path) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("seamtex: {e}");
			ExitCode::FAILURE
		}
	}
}
