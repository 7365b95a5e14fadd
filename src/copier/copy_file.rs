use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDate};
use filetime::FileTime;

#[cfg(unix)]
use std::os::unix::fs::symlink;

#[cfg(windows)]
use std::os::windows::fs::{symlink_dir, symlink_file};

/// Copy one regular file, keeping its timestamps (and permissions where the
/// platform copies them). Returns the number of bytes written.
pub fn copy_file(src_path: &Path, dst_path: &Path) -> io::Result<u64> {
	let bytes = fs::copy(src_path, dst_path)?;
	copy_file_times(src_path, dst_path)?;
	Ok(bytes)
}

fn copy_file_times(src_path: &Path, dst_path: &Path) -> io::Result<()> {
	let src_metadata = fs::metadata(src_path)?;
	let atime = FileTime::from_last_access_time(&src_metadata);
	let mtime = FileTime::from_last_modification_time(&src_metadata);
	filetime::set_file_times(dst_path, atime, mtime)
}

/// Recreate a symlink at `dst_path` pointing wherever the source link points.
/// An existing entry at `dst_path` is replaced.
pub fn copy_symlink(src_path: &Path, dst_path: &Path) -> io::Result<()> {
	let target = fs::read_link(src_path)?;

	if dst_path.symlink_metadata().is_ok() {
		fs::remove_file(dst_path)?;
	}

	#[cfg(unix)]
	symlink(&target, dst_path)?;

	#[cfg(windows)]
	if src_path.is_dir() {
		symlink_dir(&target, dst_path)?;
	} else {
		symlink_file(&target, dst_path)?;
	}

	Ok(())
}

/// Calendar day (local time) on which the entry was last modified
pub fn modified_date(metadata: &Metadata) -> io::Result<NaiveDate> {
	let modified: DateTime<Local> = metadata.modified()?.into();
	Ok(modified.date_naive())
}
