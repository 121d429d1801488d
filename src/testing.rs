//! Fixtures for testing split runs.
//!
//! Builders for ski-run features and for whole `FeatureCollection` documents
//! in the layouts found in real exports, plus a reader for produced files.
//!
//! ```
//! use skisplit::testing::*;
//!
//! let features = vec![
//!     run_feature(1, &["Heavenly Mountain Resort"]),
//!     run_feature(2, &[]),
//! ];
//! let text = collection_text(&features, Layout::LinePerFeature);
//! assert!(text.contains("\"features\": ["));
//! ```

use crate::utils::sanitize_key;
use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

/// How a fixture document is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// `serde_json` pretty printing: every feature spans many lines.
    Pretty,
    /// One compact feature per line, separated by standalone `,` lines.
    LinePerFeature,
    /// The whole document on a single line.
    Minified,
}

/// A ski-area descriptor as found under `properties.skiAreas`.
#[must_use]
pub fn ski_area(name: &str) -> Value {
    json!({
        "type": "Feature",
        "properties": {"id": sanitize_key(name).to_lowercase(), "name": name},
        "geometry": {"type": "Point", "coordinates": [-119.94, 38.93]}
    })
}

/// A downhill run belonging to `areas` (in descriptor order).
#[must_use]
pub fn run_feature(id: u32, areas: &[&str]) -> Value {
    let areas: Vec<Value> = areas.iter().map(|a| ski_area(a)).collect();
    json!({
        "type": "Feature",
        "properties": {
            "id": format!("run-{id}"),
            "type": "run",
            "uses": ["downhill"],
            "name": format!("Run {id}"),
            "difficulty": "intermediate",
            "skiAreas": areas
        },
        "geometry": {
            "type": "LineString",
            "coordinates": [[-119.94, 38.93, 2600.5], [-119.95, 38.94, 2450.25]]
        }
    })
}

/// Render `features` as a `FeatureCollection` document.
#[must_use]
pub fn collection_text(features: &[Value], layout: Layout) -> String {
    let doc = json!({"type": "FeatureCollection", "features": features});
    match layout {
        Layout::Pretty => serde_json::to_string_pretty(&doc).unwrap_or_default(),
        Layout::Minified => serde_json::to_string(&doc).unwrap_or_default(),
        Layout::LinePerFeature => {
            let mut out = String::from("{\n\"type\": \"FeatureCollection\",\n\"features\": [\n");
            for (i, f) in features.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                out.push_str(&f.to_string());
                out.push('\n');
            }
            out.push_str("]\n}\n");
            out
        }
    }
}

/// Write a fixture document to `dir/name`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_collection(
    dir: &Path,
    name: &str,
    features: &[Value],
    layout: Layout,
) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, collection_text(features, layout))
        .with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Read the `features` array of a produced collection.
///
/// # Errors
///
/// Returns an error if the file is missing or is not a collection.
pub fn read_features(path: &Path) -> Result<Vec<Value>> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let doc: Value =
        serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
    anyhow::ensure!(
        doc["type"] == "FeatureCollection",
        "{} is not a FeatureCollection",
        path.display()
    );
    doc["features"]
        .as_array()
        .cloned()
        .with_context(|| format!("{} has no features array", path.display()))
}

/// Ids (`properties.id`) of a list of run features, for compact assertions.
#[must_use]
pub fn run_ids(features: &[Value]) -> Vec<String> {
    features
        .iter()
        .filter_map(|f| f["properties"]["id"].as_str().map(str::to_string))
        .collect()
}
