//! Fatal error kinds for a split run.
//!
//! Everything here aborts the run. Recoverable conditions (a slice that fails
//! to decode, an unreadable existing collection) are logged and counted in
//! [`SplitSummary`](crate::summary::SplitSummary) instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("no input files match pattern: {0}")]
    NoInputs(String),

    #[error("\"features\" array marker not found in the first {lines} lines")]
    StartMarkerNotFound { lines: usize },

    #[error("object starting at line {line} is never closed before end of input")]
    UnterminatedObject { line: usize },

    #[error("group {key:?} re-appeared after it was already flushed (input is not grouped contiguously)")]
    GroupReappeared { key: String },
}
