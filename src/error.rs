use std::io;

/// Error type for the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Some unexpected data was encountered while reading a mesh or image file.
	#[error("{0}")]
	FormatError(String),
	/// An I/O error was encountered while reading / writing an image.
	#[error(transparent)]
	IoError(#[from] io::Error),
	/// A sparse least-squares solve reported a non-positive-definite system.
	#[error("least-squares solve failed: {0}")]
	SolveError(String),
}

/// Type returned by most of the library's functions.
pub type Result<T> = std::result::Result<T, Error>;

impl From<bincode::Error> for Error {
	fn from(err: bincode::Error) -> Error {
		use bincode::ErrorKind;
		match *err {
			ErrorKind::Io(err) => Error::IoError(err),
			// ErrorKind::InvalidUtf8Encoding is impossible, because we don't decode / encode UTF-8 strings.
			// ErrorKind::SequenceMustHaveLength is also impossible, we don't decode / encode slices.
			_ => Error::FormatError(err.to_string()),
		}
	}
}
