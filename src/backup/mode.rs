use std::fmt;

use chrono::NaiveDate;

use crate::history::History;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupMode {
	Full,
	/// Only files modified after `reference_date`, the day of the last full backup.
	Incremental { reference_date: NaiveDate },
}

impl fmt::Display for BackupMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BackupMode::Full => write!(f, "full"),
			BackupMode::Incremental { .. } => write!(f, "incremental"),
		}
	}
}

/// Pick full or incremental for a run on `today`.
///
/// A full backup is due when none has ever run or when at least
/// `full_backup_interval_days` have passed since the last one. A last full
/// date in the future (clock moved back, hand-edited history) yields a
/// negative elapsed count and stays incremental.
pub fn decide_mode(
	today: NaiveDate,
	full_backup_interval_days: u32,
	last_full_backup_date: Option<NaiveDate>,
) -> BackupMode {
	match last_full_backup_date {
		None => BackupMode::Full,
		Some(last_full) => {
			let elapsed = (today - last_full).num_days();
			if elapsed >= i64::from(full_backup_interval_days) {
				BackupMode::Full
			} else {
				BackupMode::Incremental {
					reference_date: last_full,
				}
			}
		}
	}
}

/// A backup already ran today, or the clock has gone backwards since the last one.
pub fn should_skip(today: NaiveDate, last_backup_date: Option<NaiveDate>) -> bool {
	last_backup_date.is_some_and(|last| (today - last).num_days() <= 0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupPlan {
	pub run_date: NaiveDate,
	pub mode: BackupMode,
}

impl BackupPlan {
	pub fn new(run_date: NaiveDate, full_backup_interval_days: u32, history: &History) -> Self {
		BackupPlan {
			run_date,
			mode: decide_mode(
				run_date,
				full_backup_interval_days,
				history.last_full_backup_date,
			),
		}
	}

	pub fn reference_date(&self) -> Option<NaiveDate> {
		match self.mode {
			BackupMode::Full => None,
			BackupMode::Incremental { reference_date } => Some(reference_date),
		}
	}
}
