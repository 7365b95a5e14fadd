use std::fs;
use std::io;
use std::path::Path;

use chrono::{Days, Local, NaiveDate};
use filetime::FileTime;

pub fn create_test_file(base_folder: &Path, path: &str, contents: &str) -> io::Result<()> {
	let path = base_folder.join(path);
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)?;
	}
	fs::write(path, contents)
}

pub fn file_contents_matches(file1_path: &Path, file2_path: &Path) -> io::Result<bool> {
	Ok(fs::read(file1_path)? == fs::read(file2_path)?)
}

/// Set the file's mtime to midday (local time) on `date`
pub fn set_mtime_to_date(path: &Path, date: NaiveDate) -> io::Result<()> {
	let midday = date
		.and_hms_opt(12, 0, 0)
		.and_then(|t| t.and_local_timezone(Local).earliest())
		.ok_or_else(|| io::Error::other(format!("no local midday on {}", date)))?;
	filetime::set_file_mtime(path, FileTime::from_unix_time(midday.timestamp(), 0))
}

pub fn set_mtime_days_ago(path: &Path, days: u64) -> io::Result<()> {
	let today = Local::now().date_naive();
	set_mtime_to_date(path, today - Days::new(days))
}
