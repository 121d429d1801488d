//! Eager single-group selection.
//!
//! [`select_group`] loads the entire input document into memory and writes one
//! `FeatureCollection` holding the features that belong to a single group. It
//! is the simple alternative to the streaming [`pipeline`](crate::pipeline)
//! for small inputs and ad-hoc filtering; memory grows with the input.
//!
//! Unlike the streaming classifier, a feature matches when **any** of its
//! group descriptors names the target group.

use crate::feature::FeatureCollection;
use crate::io::open_input;
use anyhow::{Context, Result};
use std::fs::{File, create_dir_all, remove_file};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Outcome of a selection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectSummary {
    pub output: PathBuf,
    pub scanned: usize,
    pub matched: usize,
}

/// `filtered_<file name>` next to `input`.
#[must_use]
pub fn default_select_output(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map_or_else(|| "output.json".into(), |n| n.to_string_lossy().into_owned());
    input.with_file_name(format!("filtered_{name}"))
}

/// Write the features of `group` from `input` into one collection.
///
/// The output is written incrementally, one compact feature per line. If
/// writing fails after this call created the output file, the partial file is
/// removed. A path that could not be created is left untouched.
///
/// # Errors
///
/// Returns an error if the input is missing or not a valid collection, or if
/// the output cannot be written.
pub fn select_group(input: &Path, group: &str, output: Option<&Path>) -> Result<SelectSummary> {
    let output = output.map_or_else(|| default_select_output(input), Path::to_path_buf);

    let reader = open_input(input)?;
    let collection: FeatureCollection = serde_json::from_reader(reader)
        .with_context(|| format!("parse {}", input.display()))?;

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }

    let file = File::create(&output).with_context(|| format!("create {}", output.display()))?;
    match write_selection(file, &collection, group, &output) {
        Ok(matched) => {
            log::info!("wrote {matched} features to {}", output.display());
            Ok(SelectSummary {
                output,
                scanned: collection.len(),
                matched,
            })
        }
        Err(e) => {
            if let Err(rm) = remove_file(&output) {
                log::warn!("could not remove partial output {}: {rm}", output.display());
            }
            Err(e)
        }
    }
}

fn write_selection(
    file: File,
    collection: &FeatureCollection,
    group: &str,
    output: &Path,
) -> Result<usize> {
    let mut w = BufWriter::new(file);
    w.write_all(b"{\"type\": \"FeatureCollection\", \"features\": [\n")?;

    let mut matched = 0usize;
    for feature in &collection.features {
        if !feature.ski_area_names().any(|name| name == group) {
            continue;
        }
        if matched > 0 {
            w.write_all(b",\n")?;
        }
        serde_json::to_writer(&mut w, feature)
            .with_context(|| format!("serialize feature #{matched} to {}", output.display()))?;
        matched += 1;
        if matched % 100 == 0 {
            log::debug!("found {matched} matching features...");
        }
    }

    w.write_all(b"\n]}\n")?;
    w.flush()
        .with_context(|| format!("flush {}", output.display()))?;
    Ok(matched)
}
