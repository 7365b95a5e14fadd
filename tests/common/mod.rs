use std::fs;
use std::io;
use std::path::Path;

use chrono::{Local, NaiveDate};
use filetime::FileTime;
use tempfile::TempDir;

pub fn create_test_folder() -> TempDir {
	TempDir::new().unwrap()
}

pub fn create_test_file(base_folder: &Path, path: &str, contents: &str) -> io::Result<()> {
	let path = base_folder.join(path);
	fs::create_dir_all(path.parent().unwrap())?;
	fs::write(path, contents)
}

pub fn write_config(
	config_dir: &Path,
	output: &Path,
	interval: u32,
	targets: &[&str],
	additional: &[(&str, &Path)],
) -> io::Result<std::path::PathBuf> {
	let additional: Vec<_> = additional
		.iter()
		.map(|(name, path)| serde_json::json!({ "name": name, "path": path }))
		.collect();
	let config = serde_json::json!({
		"output_path": output,
		"full_backup_interval": interval,
		"target_directory": targets,
		"additional_backup_directory": additional,
	});

	let path = config_dir.join("config.json");
	fs::write(&path, serde_json::to_string_pretty(&config)?)?;
	Ok(path)
}

pub fn set_mtime_to_date(path: &Path, date: NaiveDate) -> io::Result<()> {
	let midday = date
		.and_hms_opt(12, 0, 0)
		.unwrap()
		.and_local_timezone(Local)
		.earliest()
		.unwrap();
	filetime::set_file_mtime(path, FileTime::from_unix_time(midday.timestamp(), 0))
}

pub fn read_history(output: &Path) -> serde_json::Value {
	let contents = fs::read_to_string(output.join("history.json")).unwrap();
	serde_json::from_str(&contents).unwrap()
}
