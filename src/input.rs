#![forbid(unsafe_code)]

//! Log input: file discovery and line preparation

pub mod file_walker;
pub mod log_text;

pub use file_walker::{FileWalker, FileWalkerError, discover_log_files};
pub use log_text::{LogTextOptions, prepare, read_log, read_log_file};
