//! Read-modify-write persistence of per-group collections.
//!
//! Every flush loads the group's existing collection (if any), appends the new
//! batch after the existing features and rewrites the whole document. The
//! rewrite goes to a temporary file in the output directory that is renamed
//! over the target, so the target is always a complete, loadable
//! `FeatureCollection`, even if the process dies mid-write.

use crate::accumulator::BatchSink;
use crate::feature::{Feature, FeatureCollection};
use crate::utils::sanitize_key;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Suffix appended to the sanitized key to form a file name.
pub const DEFAULT_FILE_SUFFIX: &str = "_runs.json";

/// Result of one merge-write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushOutcome {
    pub path: PathBuf,
    /// Features that were already on disk.
    pub existing: usize,
    /// Features appended by this flush.
    pub added: usize,
}

impl FlushOutcome {
    #[must_use]
    pub fn total(&self) -> usize {
        self.existing + self.added
    }
}

/// Writes batches into `<output_dir>/<sanitized key><suffix>`.
#[derive(Debug)]
pub struct MergeWriter {
    output_dir: PathBuf,
    suffix: String,
    groups: BTreeSet<String>,
    unreadable: usize,
}

impl MergeWriter {
    /// Create a writer, creating `output_dir` if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        create_dir_all(&output_dir)
            .with_context(|| format!("mkdir -p {}", output_dir.display()))?;
        Ok(Self {
            output_dir,
            suffix: DEFAULT_FILE_SUFFIX.to_string(),
            groups: BTreeSet::new(),
            unreadable: 0,
        })
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Target file for a group key.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}{}", sanitize_key(key), self.suffix))
    }

    /// Distinct group keys written so far.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    /// Existing files that could not be decoded and were replaced.
    #[must_use]
    pub fn unreadable_existing(&self) -> usize {
        self.unreadable
    }

    /// Load the persisted features at `path`.
    ///
    /// A missing file is an empty base. A file that does not decode as a
    /// collection is logged, counted, and also treated as an empty base.
    ///
    /// # Errors
    ///
    /// Returns an error only if an existing file cannot be opened.
    pub fn load_existing(&mut self, path: &Path) -> Result<Vec<Feature>> {
        let f = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("open {}", path.display())),
        };
        match serde_json::from_reader::<_, FeatureCollection>(BufReader::new(f)) {
            Ok(collection) => Ok(collection.features),
            Err(e) => {
                self.unreadable += 1;
                log::warn!(
                    "could not read existing file {} ({e}); creating a new one",
                    path.display()
                );
                Ok(Vec::new())
            }
        }
    }

    /// Append `batch` to the persisted collection for `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the existing file cannot be opened or the new
    /// document cannot be written and renamed into place.
    pub fn merge_write(&mut self, key: &str, batch: Vec<Feature>) -> Result<FlushOutcome> {
        let path = self.path_for(key);
        let mut features = self.load_existing(&path)?;
        let existing = features.len();
        let added = batch.len();
        features.extend(batch);

        write_collection_atomic(&path, &FeatureCollection::new(features))?;
        self.groups.insert(key.to_string());

        let outcome = FlushOutcome {
            path,
            existing,
            added,
        };
        log::info!(
            "wrote {} new features (total: {}) to {}",
            outcome.added,
            outcome.total(),
            outcome.path.display()
        );
        Ok(outcome)
    }
}

impl BatchSink for MergeWriter {
    fn write_batch(&mut self, key: &str, batch: Vec<Feature>) -> Result<usize> {
        self.merge_write(key, batch).map(|o| o.total())
    }
}

/// Pretty-print `collection` to `path` through a temporary file in the same
/// directory, replacing any previous file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, written, synced
/// or renamed over `path`.
pub fn write_collection_atomic(path: &Path, collection: &FeatureCollection) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("create temporary file in {}", dir.display()))?;
    let mut w = BufWriter::new(tmp);
    serde_json::to_writer_pretty(&mut w, collection)
        .with_context(|| format!("serialize collection for {}", path.display()))?;
    w.write_all(b"\n")?;
    let tmp = w
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("flush {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync {}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn f(i: u32) -> Feature {
        serde_json::from_value(json!({"type": "Feature", "properties": {"id": i}})).unwrap()
    }

    fn read(path: &Path) -> FeatureCollection {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn path_uses_sanitized_key_and_suffix() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let w = MergeWriter::new(tmp.path())?;
        assert_eq!(
            w.path_for("Palisades Tahoe / Olympic Valley"),
            tmp.path().join("Palisades_Tahoe_Olympic_Valley_runs.json")
        );
        let w = w.with_suffix(".geojson");
        assert_eq!(w.path_for("A B"), tmp.path().join("A_B.geojson"));
        Ok(())
    }

    #[test]
    fn merges_after_existing_features() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut w = MergeWriter::new(tmp.path())?;

        let first = w.merge_write("Heavenly", vec![f(1), f(2)])?;
        assert_eq!((first.existing, first.added, first.total()), (0, 2, 2));

        let second = w.merge_write("Heavenly", vec![f(3)])?;
        assert_eq!((second.existing, second.added, second.total()), (2, 1, 3));

        let on_disk = read(&second.path);
        assert_eq!(on_disk.kind, "FeatureCollection");
        assert_eq!(on_disk.features, vec![f(1), f(2), f(3)]);
        assert_eq!(w.groups().collect::<Vec<_>>(), vec!["Heavenly"]);
        Ok(())
    }

    #[test]
    fn corrupt_existing_file_is_replaced() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut w = MergeWriter::new(tmp.path())?;
        let path = w.path_for("Kirkwood");
        fs::write(&path, "{\"type\": \"FeatureCollection\", \"features\": [")?;

        let out = w.merge_write("Kirkwood", vec![f(7)])?;
        assert_eq!(out.existing, 0);
        assert_eq!(w.unreadable_existing(), 1);
        assert_eq!(read(&path).features, vec![f(7)]);
        Ok(())
    }

    #[test]
    fn output_is_pretty_printed() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let mut w = MergeWriter::new(tmp.path())?;
        let out = w.merge_write("Northstar", vec![f(1)])?;
        let text = fs::read_to_string(&out.path)?;
        assert!(text.starts_with("{\n  \"type\": \"FeatureCollection\",\n  \"features\": ["));
        Ok(())
    }

    #[test]
    fn creates_missing_output_dir() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let nested = tmp.path().join("a").join("b");
        let mut w = MergeWriter::new(&nested)?;
        w.merge_write("X", vec![f(1)])?;
        assert!(nested.join("X_runs.json").is_file());
        // Only the target remains; the temporary file was renamed away.
        assert_eq!(fs::read_dir(&nested)?.count(), 1);
        Ok(())
    }
}
