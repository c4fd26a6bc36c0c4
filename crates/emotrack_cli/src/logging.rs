//! Logger setup for the command-line front end.
//!
//! Logs go to the terminal, and additionally to `--log-file` when given.

use std::path::PathBuf;

use client_logging::LogDestination;
use log::LevelFilter;

pub fn initialize(verbose: u8, log_file: Option<PathBuf>) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let destination = match log_file {
        Some(path) => LogDestination::Both(path),
        None => LogDestination::Terminal,
    };
    client_logging::initialize(destination, level);
}
