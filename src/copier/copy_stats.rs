use std::time::{Duration, Instant};

use bytesize::ByteSize;

/// Counters for one backup run, summed across every target and additional directory.
#[derive(Debug, Clone)]
pub struct CopyStats {
	start_time: Instant,
	pub files_copied: usize,
	pub bytes_copied: u64,
	/// Files left out of an incremental copy because they predate the reference date
	pub files_unchanged: usize,
	pub dirs_created: usize,
	pub symlinks_created: usize,
	/// FIFOs, sockets and device nodes
	pub special_files_skipped: usize,
}

impl Default for CopyStats {
	fn default() -> Self {
		Self::new()
	}
}

impl CopyStats {
	pub fn new() -> Self {
		CopyStats {
			start_time: Instant::now(),
			files_copied: 0,
			bytes_copied: 0,
			files_unchanged: 0,
			dirs_created: 0,
			symlinks_created: 0,
			special_files_skipped: 0,
		}
	}

	pub fn add_file_copied(&mut self, file_size: u64) {
		self.files_copied += 1;
		self.bytes_copied += file_size;
	}

	pub fn add_file_unchanged(&mut self) {
		self.files_unchanged += 1;
	}

	pub fn add_dir_created(&mut self) {
		self.dirs_created += 1;
	}

	pub fn add_symlink_created(&mut self) {
		self.symlinks_created += 1;
	}

	pub fn add_special_file_skipped(&mut self) {
		self.special_files_skipped += 1;
	}

	pub fn elapsed(&self) -> Duration {
		self.start_time.elapsed()
	}

	/// Format duration as HH:MM:SS.mmm
	fn format_duration(duration: Duration) -> String {
		let total_millis = duration.as_millis();
		let hours = total_millis / 3_600_000;
		let minutes = (total_millis % 3_600_000) / 60_000;
		let seconds = (total_millis % 60_000) / 1_000;
		let millis = total_millis % 1_000;
		format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
	}

	pub fn summary_lines(&self) -> Vec<String> {
		let mut lines = vec![
			format!(
				"Copied:      {} files, {}",
				self.files_copied,
				ByteSize(self.bytes_copied)
			),
			format!("Unchanged:   {} files", self.files_unchanged),
			format!("Directories: {}", self.dirs_created),
		];
		if self.symlinks_created > 0 {
			lines.push(format!("Symlinks:    {}", self.symlinks_created));
		}
		if self.special_files_skipped > 0 {
			lines.push(format!("Skipped:     {} special files", self.special_files_skipped));
		}
		lines.push(format!(
			"Duration:    {}",
			Self::format_duration(self.elapsed())
		));
		lines
	}
}
