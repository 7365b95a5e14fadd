//! Persisted record of when the last backups ran.
//!
//! One `history.json` lives in the output root. Its presence means at least
//! one full backup has completed, so `last_full_backup_date` is required
//! whenever the file exists.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backup::mode::BackupMode;
use crate::error::{BackupError, IoResultExt, Result};

pub const HISTORY_FILENAME: &str = "history.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct History {
	pub last_backup_date: Option<NaiveDate>,
	pub last_full_backup_date: Option<NaiveDate>,
}

impl History {
	/// The history to persist once a run on `today` has finished copying.
	pub fn after_run(&self, today: NaiveDate, mode: &BackupMode) -> History {
		let last_full_backup_date = match mode {
			BackupMode::Full => Some(today),
			BackupMode::Incremental { .. } => self.last_full_backup_date,
		};
		History {
			last_backup_date: Some(today),
			last_full_backup_date,
		}
	}
}

/// On-disk shape. A missing full date is rejected by [`load`], not by serde.
#[derive(Serialize, Deserialize)]
struct HistoryRecord {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	last_backup_date: Option<NaiveDate>,
	#[serde(default)]
	last_full_backup_date: Option<NaiveDate>,
}

pub fn history_path(output_root: &Path) -> PathBuf {
	output_root.join(HISTORY_FILENAME)
}

/// Returns `Ok(None)` when no history file exists yet.
pub fn load(output_root: &Path) -> Result<Option<History>> {
	let path = history_path(output_root);

	let contents = match fs::read_to_string(&path) {
		Ok(contents) => contents,
		Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
		Err(e) => return Err(BackupError::io(&path, e)),
	};

	let record: HistoryRecord =
		serde_json::from_str(&contents).map_err(|e| BackupError::HistoryMalformed {
			path: path.clone(),
			reason: e.to_string(),
		})?;

	let Some(last_full_backup_date) = record.last_full_backup_date else {
		return Err(BackupError::HistoryMalformed {
			path,
			reason: "last_full_backup_date is missing".to_string(),
		});
	};

	if let Some(last_backup_date) = record.last_backup_date
		&& last_backup_date < last_full_backup_date
	{
		warn!(
			%last_backup_date,
			%last_full_backup_date,
			"history lists a full backup later than the last backup"
		);
	}

	debug!(path = %path.display(), "loaded backup history");

	Ok(Some(History {
		last_backup_date: record.last_backup_date,
		last_full_backup_date: Some(last_full_backup_date),
	}))
}

/// Atomically replace the history file: write a sibling temp file, sync it,
/// then rename over the old record.
pub fn save(output_root: &Path, history: &History) -> Result<()> {
	let path = history_path(output_root);

	if history.last_full_backup_date.is_none() {
		return Err(BackupError::HistoryMalformed {
			path,
			reason: "refusing to save history without last_full_backup_date".to_string(),
		});
	}

	let record = HistoryRecord {
		last_backup_date: history.last_backup_date,
		last_full_backup_date: history.last_full_backup_date,
	};

	let temp_path = path.with_extension("json.tmp");
	let file = File::create(&temp_path).at(&temp_path)?;
	let mut writer = BufWriter::new(file);
	serde_json::to_writer_pretty(&mut writer, &record)
		.map_err(|e| BackupError::io(&temp_path, io::Error::other(e)))?;
	writer.write_all(b"\n").at(&temp_path)?;
	writer.flush().at(&temp_path)?;
	writer.get_ref().sync_all().at(&temp_path)?;
	drop(writer);

	if let Err(e) = fs::rename(&temp_path, &path) {
		let _ = fs::remove_file(&temp_path);
		return Err(BackupError::io(&path, e));
	}

	debug!(path = %path.display(), "saved backup history");
	Ok(())
}
