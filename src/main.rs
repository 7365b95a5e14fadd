mod backup;
mod config;
mod copier;
mod error;
mod history;
mod logger;

#[cfg(test)]
mod test_helpers;

use std::path::{Path, PathBuf};
use std::process;

use chrono::NaiveDate;
use clap::Parser;

use crate::backup::orchestrator::{BackupOutcome, run_backup};
use crate::backup::set_namer::local_today;
use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::error::{BackupError, Result};

/// Folder under `%APPDATA%` holding the game's save data
const APPDATA_SOURCE_SUBDIR: &str = "Stormworks/data";

#[derive(Parser)]
#[command(about = "Full and incremental backups of save-data folders", long_about = None)]
#[clap(author, version)]
struct Args {
	/// Configuration file
	#[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
	config: PathBuf,

	/// Folder containing the configured target directories
	#[arg(short, long, env = "SAVEDATA_SOURCE_ROOT")]
	source_root: Option<PathBuf>,

	/// Run as if today were this date (YYYY-MM-DD)
	#[arg(long)]
	date: Option<NaiveDate>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

fn main() {
	println!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
	println!("License: {}", env!("CARGO_PKG_LICENSE"));
	println!();

	let args = Args::parse();
	logger::init(&args.log_level);

	match run(&args) {
		Ok(outcome) => println!("{}", outcome),
		Err(e) => {
			eprintln!("\nBackup failed: {}", e);
			process::exit(1);
		}
	}
}

fn run(args: &Args) -> Result<BackupOutcome> {
	let config = Config::from_file(&args.config)?;
	let source_root = resolve_source_root(args.source_root.as_deref())?;
	let date = args.date;

	let outcome = run_backup(&config, &source_root, || date.unwrap_or_else(local_today))?;

	if let BackupOutcome::Completed {
		output_dir, stats, ..
	} = &outcome
	{
		println!("Backup written to {}", output_dir.display());
		for line in stats.summary_lines() {
			println!("{}", line);
		}
	}
	Ok(outcome)
}

/// Explicit flag or env var first, otherwise the game's folder under `%APPDATA%`.
fn resolve_source_root(explicit: Option<&Path>) -> Result<PathBuf> {
	if let Some(path) = explicit {
		return Ok(path.to_path_buf());
	}

	match std::env::var_os("APPDATA") {
		Some(appdata) => Ok(PathBuf::from(appdata).join(APPDATA_SOURCE_SUBDIR)),
		None => Err(BackupError::ConfigMissing {
			path: PathBuf::from("--source-root / SAVEDATA_SOURCE_ROOT / %APPDATA%"),
		}),
	}
}
