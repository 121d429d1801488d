//! Counters collected over a split run.
//!
//! A [`SplitSummary`] is returned by every pipeline entry point. It can be
//! logged in a human-readable form or saved as JSON next to the output.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    /// Input files processed.
    pub inputs: usize,
    /// Raw slices produced by the scanner.
    pub slices_scanned: u64,
    /// Slices that failed to decode and were skipped.
    pub slices_dropped: u64,
    /// Features routed into a batch.
    pub features_routed: u64,
    /// Features with no usable group descriptor.
    pub features_without_group: u64,
    /// Features whose group is not on the allow-list.
    pub features_not_allowed: u64,
    /// Completed batches written.
    pub batches_flushed: u64,
    /// Groups that came back after being flushed.
    pub group_reappearances: u64,
    /// Existing output files that could not be decoded and were replaced.
    pub unreadable_outputs: u64,
    /// Distinct groups written, in name order.
    pub groups: Vec<String>,
    /// Wall time of the run in milliseconds.
    pub elapsed_ms: u64,
}

impl SplitSummary {
    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    }

    /// Log the summary at `info`.
    pub fn log(&self) {
        log::info!(
            "processed {} features across {} groups in {} ms",
            self.features_routed,
            self.groups.len(),
            self.elapsed_ms
        );
        log::info!(
            "scanned {} slices: {} dropped, {} without group, {} not allowed; {} batches flushed",
            self.slices_scanned,
            self.slices_dropped,
            self.features_without_group,
            self.features_not_allowed,
            self.batches_flushed
        );
        if self.group_reappearances > 0 {
            log::warn!(
                "{} group re-appearances: input is not grouped contiguously",
                self.group_reappearances
            );
        }
    }

    /// Save the summary as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written to.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let formatted = serde_json::to_string_pretty(self)?;
        file.write_all(formatted.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}
