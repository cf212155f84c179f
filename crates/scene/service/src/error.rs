use std::io;
use std::path::{Path, PathBuf};

use sceneplus_document::{MergeError, ParseError};
use serde::{Deserialize, Serialize};

/// Failure of a service operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
	/// The scenes file is not a valid scene document.
	#[error("invalid scenes file: {0}")]
	Parse(#[from] ParseError),
	/// The target resolves to no known scene.
	#[error("scene `{0}` not found")]
	NotFound(String),
	/// The scene is known to the registry but missing from the scenes file.
	#[error("scene `{0}` is missing from the scenes file; reload to resynchronize")]
	Stale(String),
	/// Reading, locking or writing a file failed.
	#[error("{}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	/// The service call itself is malformed.
	#[error("invalid request: {0}")]
	InvalidRequest(String),
}

impl ServiceError {
	pub(crate) fn io(path: &Path, source: io::Error) -> Self {
		Self::Io {
			path: path.to_path_buf(),
			source,
		}
	}

	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Parse(_) => ErrorKind::ParseError,
			Self::NotFound(_) => ErrorKind::NotFound,
			Self::Stale(_) => ErrorKind::Stale,
			Self::Io { .. } => ErrorKind::IoFailure,
			Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
		}
	}

	pub fn payload(&self) -> ErrorPayload {
		ErrorPayload {
			kind: self.kind(),
			message: self.to_string(),
		}
	}
}

impl From<MergeError> for ServiceError {
	fn from(error: MergeError) -> Self {
		match error {
			MergeError::SceneNotFound(id) => Self::Stale(id),
		}
	}
}

/// Wire classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
	ParseError,
	NotFound,
	Stale,
	IoFailure,
	InvalidRequest,
}

/// Serialized form of a failure: `{"kind": "NotFound", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub kind: ErrorKind,
	pub message: String,
}
