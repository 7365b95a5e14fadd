use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::backup::mode::BackupMode;
use crate::copier::copy_file::{copy_file, copy_symlink, modified_date};
use crate::copier::copy_stats::CopyStats;
use crate::error::{BackupError, IoResultExt, Result};

/// Copies target folders from a fixed source root into a dated output root.
#[derive(Debug, Clone)]
pub struct DirectoryCopier {
	source_root: PathBuf,
}

impl DirectoryCopier {
	pub fn new(source_root: impl Into<PathBuf>) -> Self {
		DirectoryCopier {
			source_root: source_root.into(),
		}
	}

	/// Copy `source_root/subpath` to `dated_root/subpath`.
	///
	/// In full mode the destination must not exist yet. In incremental mode
	/// every directory is recreated but only files last modified on a day
	/// after `reference_date` are copied.
	pub fn copy_target(
		&self,
		subpath: &str,
		dated_root: &Path,
		mode: BackupMode,
		stats: &mut CopyStats,
	) -> Result<()> {
		let source = self.source_root.join(subpath);
		let dest = dated_root.join(subpath);
		ensure_source_dir(&source)?;

		info!(
			source = %source.display(),
			dest = %dest.display(),
			%mode,
			"backing up target"
		);

		match mode {
			BackupMode::Full => copy_full(&source, &dest, stats),
			BackupMode::Incremental { reference_date } => {
				copy_incremental(&source, &dest, reference_date, stats)
			}
		}
	}
}

/// Copy an entire folder into `dest`, which may already exist. Files already
/// present in `dest` are overwritten, anything else there is left alone.
pub fn merge_directory(source: &Path, dest: &Path, stats: &mut CopyStats) -> Result<()> {
	ensure_source_dir(source)?;
	info!(
		source = %source.display(),
		dest = %dest.display(),
		"merging additional directory"
	);

	fs::create_dir_all(dest).at(dest)?;
	copy_tree(source, dest, Path::new(""), stats)
}

fn ensure_source_dir(source: &Path) -> Result<()> {
	match fs::metadata(source) {
		Ok(metadata) if metadata.is_dir() => Ok(()),
		Ok(_) => Err(BackupError::SourcePathMissing {
			path: source.to_path_buf(),
		}),
		Err(ref e) if e.kind() == io::ErrorKind::NotFound => Err(BackupError::SourcePathMissing {
			path: source.to_path_buf(),
		}),
		Err(e) => Err(BackupError::io(source, e)),
	}
}

fn copy_full(source: &Path, dest: &Path, stats: &mut CopyStats) -> Result<()> {
	if dest.symlink_metadata().is_ok() {
		return Err(BackupError::DestinationConflict {
			path: dest.to_path_buf(),
		});
	}

	if let Some(parent) = dest.parent() {
		fs::create_dir_all(parent).at(parent)?;
	}
	fs::create_dir(dest).at(dest)?;
	stats.add_dir_created();

	copy_tree(source, dest, Path::new(""), stats)
}

fn copy_incremental(
	source: &Path,
	dest: &Path,
	reference_date: NaiveDate,
	stats: &mut CopyStats,
) -> Result<()> {
	if let Some(parent) = dest.parent() {
		fs::create_dir_all(parent).at(parent)?;
	}
	create_dir_tolerant(dest, stats)?;

	create_skeleton(source, dest, Path::new(""), stats)?;
	copy_modified_files(source, dest, Path::new(""), reference_date, stats)
}

/// Create `path` unless a directory is already there.
fn create_dir_tolerant(path: &Path, stats: &mut CopyStats) -> Result<()> {
	match fs::create_dir(path) {
		Ok(()) => {
			stats.add_dir_created();
			Ok(())
		}
		Err(ref e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
		Err(e) => Err(BackupError::io(path, e)),
	}
}

/// Recursively copy everything under `src_root/rel` to `dst_root/rel`.
fn copy_tree(src_root: &Path, dst_root: &Path, rel: &Path, stats: &mut CopyStats) -> Result<()> {
	let current = src_root.join(rel);

	for entry in fs::read_dir(&current).at(&current)? {
		let entry = entry.at(&current)?;
		let rel_path = rel.join(entry.file_name());
		let src_path = entry.path();
		let dst_path = dst_root.join(&rel_path);
		let file_type = entry.file_type().at(&src_path)?;

		if file_type.is_symlink() {
			copy_symlink(&src_path, &dst_path).at(&dst_path)?;
			stats.add_symlink_created();
		} else if file_type.is_dir() {
			create_dir_tolerant(&dst_path, stats)?;
			copy_tree(src_root, dst_root, &rel_path, stats)?;
		} else if file_type.is_file() {
			remove_if_symlink(&dst_path)?;
			debug!(file = %rel_path.display(), "copying");
			let bytes = copy_file(&src_path, &dst_path).at(&src_path)?;
			stats.add_file_copied(bytes);
		} else {
			skip_special_file(&src_path, stats);
		}
	}

	Ok(())
}

/// First incremental pass: mirror every directory, empty ones included.
fn create_skeleton(
	src_root: &Path,
	dst_root: &Path,
	rel: &Path,
	stats: &mut CopyStats,
) -> Result<()> {
	let current = src_root.join(rel);

	for entry in fs::read_dir(&current).at(&current)? {
		let entry = entry.at(&current)?;
		let file_type = entry.file_type().at(&entry.path())?;
		if !file_type.is_dir() {
			continue;
		}

		let rel_path = rel.join(entry.file_name());
		create_dir_tolerant(&dst_root.join(&rel_path), stats)?;
		create_skeleton(src_root, dst_root, &rel_path, stats)?;
	}

	Ok(())
}

/// Second incremental pass: copy entries modified strictly after `reference_date`.
fn copy_modified_files(
	src_root: &Path,
	dst_root: &Path,
	rel: &Path,
	reference_date: NaiveDate,
	stats: &mut CopyStats,
) -> Result<()> {
	let current = src_root.join(rel);

	for entry in fs::read_dir(&current).at(&current)? {
		let entry = entry.at(&current)?;
		let rel_path = rel.join(entry.file_name());
		let src_path = entry.path();
		let file_type = entry.file_type().at(&src_path)?;

		if file_type.is_dir() {
			copy_modified_files(src_root, dst_root, &rel_path, reference_date, stats)?;
			continue;
		}

		if !file_type.is_file() && !file_type.is_symlink() {
			skip_special_file(&src_path, stats);
			continue;
		}

		// DirEntry::metadata does not follow symlinks
		let metadata = entry.metadata().at(&src_path)?;
		let modified = modified_date(&metadata).at(&src_path)?;
		if modified <= reference_date {
			stats.add_file_unchanged();
			continue;
		}

		let dst_path = dst_root.join(&rel_path);
		if file_type.is_symlink() {
			copy_symlink(&src_path, &dst_path).at(&dst_path)?;
			stats.add_symlink_created();
		} else {
			remove_if_symlink(&dst_path)?;
			debug!(file = %rel_path.display(), %modified, "copying modified file");
			let bytes = copy_file(&src_path, &dst_path).at(&src_path)?;
			stats.add_file_copied(bytes);
		}
	}

	Ok(())
}

// fs::copy would write through a link left at the destination
fn remove_if_symlink(path: &Path) -> Result<()> {
	match path.symlink_metadata() {
		Ok(metadata) if metadata.file_type().is_symlink() => fs::remove_file(path).at(path),
		_ => Ok(()),
	}
}

fn skip_special_file(path: &Path, stats: &mut CopyStats) {
	warn!(path = %path.display(), "skipping special file");
	stats.add_special_file_skipped();
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_helpers::{create_test_file, set_mtime_to_date};
	use filetime::FileTime;
	use tempfile::tempdir;

	fn date(y: i32, m: u32, d: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, d).unwrap()
	}

	#[test]
	fn test_full_copy_of_nested_tree() -> Result<()> {
		let source_root = tempdir().unwrap();
		let dated_root = tempdir().unwrap();
		create_test_file(source_root.path(), "saves/slot1/save.xml", "slot one").unwrap();
		create_test_file(source_root.path(), "saves/top.txt", "top").unwrap();
		fs::create_dir_all(source_root.path().join("saves/empty/deeper")).unwrap();

		let copier = DirectoryCopier::new(source_root.path());
		let mut stats = CopyStats::new();
		copier.copy_target("saves", dated_root.path(), BackupMode::Full, &mut stats)?;

		let dest = dated_root.path().join("saves");
		assert_eq!(
			fs::read_to_string(dest.join("slot1/save.xml")).unwrap(),
			"slot one"
		);
		assert_eq!(fs::read_to_string(dest.join("top.txt")).unwrap(), "top");
		assert!(dest.join("empty/deeper").is_dir());
		assert_eq!(stats.files_copied, 2);
		Ok(())
	}

	#[test]
	fn test_full_copy_preserves_mtime() -> Result<()> {
		let source_root = tempdir().unwrap();
		let dated_root = tempdir().unwrap();
		let file = source_root.path().join("saves/old.txt");
		create_test_file(source_root.path(), "saves/old.txt", "old").unwrap();
		set_mtime_to_date(&file, date(2020, 5, 17)).unwrap();

		DirectoryCopier::new(source_root.path()).copy_target(
			"saves",
			dated_root.path(),
			BackupMode::Full,
			&mut CopyStats::new(),
		)?;

		let original = FileTime::from_last_modification_time(&fs::metadata(&file).unwrap());
		let copied = FileTime::from_last_modification_time(
			&fs::metadata(dated_root.path().join("saves/old.txt")).unwrap(),
		);
		assert_eq!(original, copied);
		Ok(())
	}

	#[test]
	fn test_full_copy_onto_existing_destination_fails() {
		let source_root = tempdir().unwrap();
		let dated_root = tempdir().unwrap();
		create_test_file(source_root.path(), "saves/a.txt", "a").unwrap();
		fs::create_dir_all(dated_root.path().join("saves")).unwrap();

		let err = DirectoryCopier::new(source_root.path())
			.copy_target(
				"saves",
				dated_root.path(),
				BackupMode::Full,
				&mut CopyStats::new(),
			)
			.unwrap_err();

		assert!(matches!(err, BackupError::DestinationConflict { .. }));
		assert!(!dated_root.path().join("saves/a.txt").exists());
	}

	#[test]
	fn test_missing_source_fails() {
		let source_root = tempdir().unwrap();
		let dated_root = tempdir().unwrap();

		for mode in [
			BackupMode::Full,
			BackupMode::Incremental {
				reference_date: date(2024, 1, 1),
			},
		] {
			let err = DirectoryCopier::new(source_root.path())
				.copy_target("absent", dated_root.path(), mode, &mut CopyStats::new())
				.unwrap_err();
			assert!(matches!(err, BackupError::SourcePathMissing { .. }));
		}
	}

	#[test]
	fn test_incremental_copies_only_newer_files() -> Result<()> {
		let source_root = tempdir().unwrap();
		let dated_root = tempdir().unwrap();
		let reference_date = date(2024, 1, 1);

		create_test_file(source_root.path(), "saves/new/a.txt", "changed").unwrap();
		create_test_file(source_root.path(), "saves/old/b.txt", "untouched").unwrap();
		fs::create_dir_all(source_root.path().join("saves/empty")).unwrap();
		set_mtime_to_date(&source_root.path().join("saves/new/a.txt"), date(2024, 1, 3)).unwrap();
		set_mtime_to_date(&source_root.path().join("saves/old/b.txt"), date(2023, 12, 20))
			.unwrap();

		let mut stats = CopyStats::new();
		DirectoryCopier::new(source_root.path()).copy_target(
			"saves",
			dated_root.path(),
			BackupMode::Incremental { reference_date },
			&mut stats,
		)?;

		let dest = dated_root.path().join("saves");
		assert_eq!(fs::read_to_string(dest.join("new/a.txt")).unwrap(), "changed");
		assert!(!dest.join("old/b.txt").exists(), "old file should be left out");
		assert!(dest.join("old").is_dir(), "old file's folder should still exist");
		assert!(dest.join("empty").is_dir(), "empty folders should be mirrored");
		assert_eq!(stats.files_copied, 1);
		assert_eq!(stats.files_unchanged, 1);
		Ok(())
	}

	#[test]
	fn test_incremental_compares_whole_days() -> Result<()> {
		let source_root = tempdir().unwrap();
		let dated_root = tempdir().unwrap();
		let reference_date = date(2024, 1, 1);

		// Modified later on the same day as the full backup
		create_test_file(source_root.path(), "saves/same_day.txt", "x").unwrap();
		set_mtime_to_date(&source_root.path().join("saves/same_day.txt"), reference_date)
			.unwrap();

		DirectoryCopier::new(source_root.path()).copy_target(
			"saves",
			dated_root.path(),
			BackupMode::Incremental { reference_date },
			&mut CopyStats::new(),
		)?;

		assert!(!dated_root.path().join("saves/same_day.txt").exists());
		assert!(dated_root.path().join("saves").is_dir());
		Ok(())
	}

	#[test]
	fn test_incremental_tolerates_existing_destination() -> Result<()> {
		let source_root = tempdir().unwrap();
		let dated_root = tempdir().unwrap();
		create_test_file(source_root.path(), "saves/sub/a.txt", "a").unwrap();
		set_mtime_to_date(&source_root.path().join("saves/sub/a.txt"), date(2024, 2, 2)).unwrap();
		fs::create_dir_all(dated_root.path().join("saves/sub")).unwrap();

		DirectoryCopier::new(source_root.path()).copy_target(
			"saves",
			dated_root.path(),
			BackupMode::Incremental {
				reference_date: date(2024, 2, 1),
			},
			&mut CopyStats::new(),
		)?;

		assert!(dated_root.path().join("saves/sub/a.txt").exists());
		Ok(())
	}

	#[test]
	fn test_nested_target_subpath() -> Result<()> {
		let source_root = tempdir().unwrap();
		let dated_root = tempdir().unwrap();
		create_test_file(source_root.path(), "data/vehicles/car.xml", "vroom").unwrap();

		DirectoryCopier::new(source_root.path()).copy_target(
			"data/vehicles",
			dated_root.path(),
			BackupMode::Full,
			&mut CopyStats::new(),
		)?;

		assert_eq!(
			fs::read_to_string(dated_root.path().join("data/vehicles/car.xml")).unwrap(),
			"vroom"
		);
		Ok(())
	}

	#[test]
	fn test_merge_into_existing_directory() -> Result<()> {
		let source = tempdir().unwrap();
		let dest = tempdir().unwrap();
		create_test_file(source.path(), "mod.lua", "new").unwrap();
		create_test_file(source.path(), "nested/extra.txt", "extra").unwrap();
		create_test_file(dest.path(), "mod.lua", "old").unwrap();
		create_test_file(dest.path(), "keep.txt", "keep").unwrap();

		let mut stats = CopyStats::new();
		merge_directory(source.path(), dest.path(), &mut stats)?;

		assert_eq!(fs::read_to_string(dest.path().join("mod.lua")).unwrap(), "new");
		assert_eq!(
			fs::read_to_string(dest.path().join("nested/extra.txt")).unwrap(),
			"extra"
		);
		assert_eq!(fs::read_to_string(dest.path().join("keep.txt")).unwrap(), "keep");
		assert_eq!(stats.files_copied, 2);
		Ok(())
	}

	#[test]
	fn test_merge_missing_source_fails() {
		let dest = tempdir().unwrap();
		let err = merge_directory(
			&dest.path().join("does-not-exist"),
			&dest.path().join("out"),
			&mut CopyStats::new(),
		)
		.unwrap_err();
		assert!(matches!(err, BackupError::SourcePathMissing { .. }));
	}

	#[cfg(unix)]
	#[test]
	fn test_symlinks_are_recreated() -> Result<()> {
		use std::os::unix::fs::symlink;

		let source_root = tempdir().unwrap();
		let dated_root = tempdir().unwrap();
		create_test_file(source_root.path(), "saves/real.txt", "real").unwrap();
		symlink("real.txt", source_root.path().join("saves/link.txt")).unwrap();

		let mut stats = CopyStats::new();
		DirectoryCopier::new(source_root.path()).copy_target(
			"saves",
			dated_root.path(),
			BackupMode::Full,
			&mut stats,
		)?;

		let link = dated_root.path().join("saves/link.txt");
		assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
		assert_eq!(fs::read_link(&link).unwrap(), Path::new("real.txt"));
		assert_eq!(stats.symlinks_created, 1);
		Ok(())
	}
}
