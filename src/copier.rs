pub mod copy_file;
pub mod copy_folder;
pub mod copy_stats;
