//! Input path resolution with glob support.
//!
//! A `split` run can take one document or a pattern such as
//! `exports/runs-*.geojson.gz`. Matches are processed in sorted order so a
//! run over the same file set is deterministic.

use crate::error::SplitError;
use anyhow::{Context, Result};
use glob::glob;
use std::path::PathBuf;

/// True when `pattern` contains glob metacharacters.
#[must_use]
pub fn is_pattern(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand a glob pattern into a sorted vector of matching files.
///
/// Directories are skipped. No match yields an empty vector.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or a matched entry cannot be
/// read.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }
    result.sort();
    Ok(result)
}

/// Resolve the `split` input argument into the files to process.
///
/// A literal path must exist ([`SplitError::InputNotFound`] otherwise); a
/// pattern must match at least one file ([`SplitError::NoInputs`]).
///
/// # Errors
///
/// See above, plus the errors of [`expand_glob`].
pub fn resolve_inputs(input: &str) -> Result<Vec<PathBuf>> {
    if !is_pattern(input) {
        let path = PathBuf::from(input);
        if !path.exists() {
            return Err(SplitError::InputNotFound(path).into());
        }
        return Ok(vec![path]);
    }
    let files = expand_glob(input)?;
    if files.is_empty() {
        return Err(SplitError::NoInputs(input.to_string()).into());
    }
    Ok(files)
}
