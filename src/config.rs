//! Backup configuration, read from a JSON file.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BackupError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
	/// Root under which one folder per run date is created
	pub output_path: PathBuf,

	/// Days between full backups
	#[serde(rename = "full_backup_interval")]
	pub full_backup_interval_days: u32,

	/// Subfolders of the source root to back up, in order
	#[serde(rename = "target_directory")]
	pub target_directories: Vec<String>,

	/// Folders outside the source root, always copied in full
	#[serde(rename = "additional_backup_directory", default)]
	pub additional_directories: Vec<AdditionalDirectory>,

	/// Optional folder under the dated root grouping the additional directories
	#[serde(default)]
	pub additional_directory_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalDirectory {
	pub name: String,
	pub path: PathBuf,
}

impl Config {
	pub fn from_file(path: &Path) -> Result<Self> {
		let file = match File::open(path) {
			Ok(file) => file,
			Err(e) if e.kind() == io::ErrorKind::NotFound => {
				return Err(BackupError::ConfigMissing {
					path: path.to_path_buf(),
				});
			}
			Err(e) => return Err(BackupError::io(path, e)),
		};

		let config: Config = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
			if source.is_io() {
				BackupError::io(path, io::Error::other(source))
			} else {
				BackupError::ConfigMalformed {
					path: path.to_path_buf(),
					source,
				}
			}
		})?;

		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<()> {
		if self.full_backup_interval_days < 1 {
			return Err(BackupError::ConfigInvalid(
				"full_backup_interval must be at least 1 day".to_string(),
			));
		}

		for target in &self.target_directories {
			if !is_plain_relative(Path::new(target)) {
				return Err(BackupError::ConfigInvalid(format!(
					"target directory {:?} must be a relative path inside the source root",
					target
				)));
			}
		}

		for dir in &self.additional_directories {
			if !is_single_name(&dir.name) {
				return Err(BackupError::ConfigInvalid(format!(
					"additional directory name {:?} must be a single folder name",
					dir.name
				)));
			}
		}

		if let Some(group) = &self.additional_directory_group
			&& !is_single_name(group)
		{
			return Err(BackupError::ConfigInvalid(format!(
				"additional_directory_group {:?} must be a single folder name",
				group
			)));
		}

		Ok(())
	}

	/// Where the additional directories go inside a dated output root.
	pub fn additional_root(&self, dated_root: &Path) -> PathBuf {
		match &self.additional_directory_group {
			Some(group) => dated_root.join(group),
			None => dated_root.to_path_buf(),
		}
	}
}

fn is_plain_relative(path: &Path) -> bool {
	let mut components = path.components().peekable();
	components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

fn is_single_name(name: &str) -> bool {
	let mut components = Path::new(name).components();
	matches!(
		(components.next(), components.next()),
		(Some(Component::Normal(_)), None)
	)
}
