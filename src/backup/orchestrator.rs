use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::backup::mode::{BackupPlan, should_skip};
use crate::backup::set_namer::generate_name;
use crate::config::Config;
use crate::copier::copy_folder::{DirectoryCopier, merge_directory};
use crate::copier::copy_stats::CopyStats;
use crate::error::{IoResultExt, Result};
use crate::history;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
	Start,
	HistoryLoaded,
	Decided,
	Copying,
	HistorySaved,
	Done,
	Skipped,
}

fn enter(state: RunState) {
	debug!(?state, "backup run state");
}

#[derive(Debug)]
pub enum BackupOutcome {
	/// Nothing copied and history untouched
	Skipped { last_backup_date: NaiveDate },
	Completed {
		plan: BackupPlan,
		output_dir: PathBuf,
		stats: CopyStats,
	},
}

impl fmt::Display for BackupOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BackupOutcome::Skipped { last_backup_date } => {
				write!(f, "Backup skipped: already backed up on {}", last_backup_date)
			}
			BackupOutcome::Completed { plan, .. } => {
				write!(f, "Backup complete (type: {})", plan.mode)
			}
		}
	}
}

/// Run one backup: decide full or incremental from the stored history, copy
/// every configured folder into `output_path/<today>`, then record the run.
///
/// History is only written once every copy has succeeded, so any error
/// leaves the next run facing the same decision.
pub fn run_backup<F>(config: &Config, source_root: &Path, today: F) -> Result<BackupOutcome>
where
	F: Fn() -> NaiveDate,
{
	enter(RunState::Start);
	let today = today();
	let output_root = config.output_path.as_path();

	let previous = match history::load(output_root)? {
		Some(previous) => previous,
		None => {
			info!(
				path = %history::history_path(output_root).display(),
				"no backup history found, a full backup will be made"
			);
			history::History::default()
		}
	};
	enter(RunState::HistoryLoaded);

	if let Some(last_backup_date) = previous.last_backup_date
		&& should_skip(today, Some(last_backup_date))
	{
		enter(RunState::Skipped);
		info!(%today, %last_backup_date, "backup already made, skipping");
		return Ok(BackupOutcome::Skipped { last_backup_date });
	}

	let plan = BackupPlan::new(today, config.full_backup_interval_days, &previous);
	enter(RunState::Decided);
	match plan.reference_date() {
		None => info!(%today, "running full backup"),
		Some(reference_date) => {
			info!(%today, since = %reference_date, "running incremental backup")
		}
	}

	let output_dir = output_root.join(generate_name(today));
	fs::create_dir_all(&output_dir).at(&output_dir)?;

	enter(RunState::Copying);
	let copier = DirectoryCopier::new(source_root);
	let mut stats = CopyStats::new();

	for target in &config.target_directories {
		copier.copy_target(target, &output_dir, plan.mode, &mut stats)?;
	}

	let additional_root = config.additional_root(&output_dir);
	for dir in &config.additional_directories {
		merge_directory(&dir.path, &additional_root.join(&dir.name), &mut stats)?;
	}

	history::save(output_root, &previous.after_run(today, &plan.mode))?;
	enter(RunState::HistorySaved);

	info!(
		files = stats.files_copied,
		bytes = stats.bytes_copied,
		"backup finished"
	);
	enter(RunState::Done);

	Ok(BackupOutcome::Completed {
		plan,
		output_dir,
		stats,
	})
}
