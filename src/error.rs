use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BackupError>;

/// Everything that can stop a backup run.
///
/// A missing history file is not an error; [`crate::history::load`] reports
/// it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum BackupError {
	#[error("configuration not found: {}", .path.display())]
	ConfigMissing { path: PathBuf },

	#[error("could not parse configuration {}: {source}", .path.display())]
	ConfigMalformed {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid configuration: {0}")]
	ConfigInvalid(String),

	#[error("backup history {} is malformed: {reason}", .path.display())]
	HistoryMalformed { path: PathBuf, reason: String },

	#[error("source directory does not exist: {}", .path.display())]
	SourcePathMissing { path: PathBuf },

	#[error("destination already exists, refusing to run a full copy onto it: {}", .path.display())]
	DestinationConflict { path: PathBuf },

	#[error("I/O error at {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

impl BackupError {
	pub fn io(path: &Path, source: io::Error) -> Self {
		BackupError::Io {
			path: path.to_path_buf(),
			source,
		}
	}
}

/// Attach the failing path to a bare `io::Result`.
pub trait IoResultExt<T> {
	fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
	fn at(self, path: &Path) -> Result<T> {
		self.map_err(|e| BackupError::io(path, e))
	}
}
