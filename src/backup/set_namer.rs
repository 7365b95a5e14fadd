use chrono::{Datelike, Local, NaiveDate};

/// Name of the per-run folder under the output root, e.g. `2024-01-08`.
pub fn generate_name(date: NaiveDate) -> String {
	format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Today's date in the machine's local time zone
pub fn local_today() -> NaiveDate {
	Local::now().date_naive()
}
