//! The streaming split pipeline.
//!
//! Data flows strictly left to right:
//!
//! ```text
//! stream -> BoundaryScanner -> decode_feature -> classify -> BatchAccumulator -> BatchSink
//! ```
//!
//! One object is in flight at a time and every flush completes before the next
//! feature is accepted. Memory is bounded by the current line, the object being
//! scanned and the current group's batch, independent of input size.
//!
//! The accumulator is an explicit value threaded through [`split_reader`], so
//! several inputs can feed one run: a group that continues from one file into
//! the next stays in the same batch.

use crate::accumulator::{BatchAccumulator, BatchSink, OrderingPolicy};
use crate::classify::{AllowList, Classification, classify};
use crate::decoder::{decode_feature, excerpt};
use crate::io::open_input;
use crate::scanner::{BoundaryMode, BoundaryScanner, DEFAULT_MAX_HEADER_LINES};
use crate::summary::SplitSummary;
use crate::writer::{DEFAULT_FILE_SUFFIX, MergeWriter};
use anyhow::{Context, Result};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Configuration for a split run.
#[derive(Clone, Debug)]
pub struct SplitConfig {
    /// Directory receiving one file per group.
    pub output_dir: PathBuf,
    /// Suffix appended to the sanitized group key.
    pub file_suffix: String,
    /// Leading lines searched for the `"features": [` marker.
    pub max_header_lines: usize,
    /// How object boundaries are detected.
    pub boundary: BoundaryMode,
    /// What to do when a group re-appears.
    pub ordering: OrderingPolicy,
    /// Groups that are written; everything else is dropped.
    pub allow_list: AllowList,
    /// Log progress every this many routed features (0 disables).
    pub progress_every: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_suffix: DEFAULT_FILE_SUFFIX.to_string(),
            max_header_lines: DEFAULT_MAX_HEADER_LINES,
            boundary: BoundaryMode::Naive,
            ordering: OrderingPolicy::AssumeContiguous,
            allow_list: AllowList::embedded(),
            progress_every: 1000,
        }
    }
}

impl SplitConfig {
    /// Default configuration writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }
}

/// Directory next to `input`, used when no output directory is given.
#[must_use]
pub fn default_output_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Run one input stream through scanner, decoder and classifier into `acc`.
///
/// The accumulator is not finished here; call [`BatchAccumulator::finish`]
/// once all inputs are consumed.
///
/// # Errors
///
/// Returns the first fatal error: a read failure, a missing array marker, an
/// unterminated object, a sink failure, or an ordering violation.
pub fn split_reader<R, S>(
    reader: R,
    config: &SplitConfig,
    acc: &mut BatchAccumulator,
    sink: &mut S,
    summary: &mut SplitSummary,
) -> Result<()>
where
    R: BufRead,
    S: BatchSink + ?Sized,
{
    let scanner = BoundaryScanner::with_options(reader, config.boundary, config.max_header_lines);
    for slice in scanner {
        let slice = slice?;
        summary.slices_scanned += 1;

        let feature = match decode_feature(&slice) {
            Ok(f) => f,
            Err(e) => {
                summary.slices_dropped += 1;
                log::warn!(
                    "skipping malformed object at line {}: {e} ({})",
                    slice.line,
                    excerpt(&slice)
                );
                continue;
            }
        };

        let key = match classify(&feature, &config.allow_list) {
            Classification::Routed(key) => key,
            Classification::NoGroup => {
                summary.features_without_group += 1;
                continue;
            }
            Classification::NotAllowed(name) => {
                summary.features_not_allowed += 1;
                log::trace!("dropping feature of group {name:?} (not on the allow-list)");
                continue;
            }
        };

        if acc.current_key() != Some(key.as_str()) {
            log::info!("processing {key}...");
        }
        if acc.push(&key, feature, sink)?.is_some() {
            summary.batches_flushed += 1;
        }
        summary.features_routed += 1;
        if config.progress_every > 0 && summary.features_routed % config.progress_every == 0 {
            log::debug!("processed {} features...", summary.features_routed);
        }
    }
    Ok(())
}

/// Split every file in `inputs`, in order, into per-group collections.
///
/// # Errors
///
/// Returns the first fatal error. Batches flushed before the failure remain
/// on disk as complete documents.
pub fn split_files(inputs: &[PathBuf], config: &SplitConfig) -> Result<SplitSummary> {
    let started = Instant::now();
    let mut writer =
        MergeWriter::new(&config.output_dir)?.with_suffix(config.file_suffix.clone());
    let mut acc = BatchAccumulator::new(config.ordering);
    let mut summary = SplitSummary::default();

    for input in inputs {
        log::info!("processing JSON file {}", input.display());
        let reader = open_input(input)?;
        split_reader(reader, config, &mut acc, &mut writer, &mut summary)
            .with_context(|| format!("split {}", input.display()))?;
        summary.inputs += 1;
    }

    summary.group_reappearances = acc.reappearances() as u64;
    if acc.finish(&mut writer)?.is_some() {
        summary.batches_flushed += 1;
    }
    summary.unreadable_outputs = writer.unreadable_existing() as u64;
    summary.groups = writer.groups().map(str::to_string).collect();
    summary.set_elapsed(started.elapsed());
    Ok(summary)
}

/// Split one file. See [`split_files`].
///
/// # Errors
///
/// See [`split_files`].
pub fn split_file(input: impl AsRef<Path>, config: &SplitConfig) -> Result<SplitSummary> {
    split_files(&[input.as_ref().to_path_buf()], config)
}
