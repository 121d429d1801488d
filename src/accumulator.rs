//! Batch accumulation and the flush-on-key-change policy.
//!
//! The accumulator holds the features of the *current* group only. When a
//! feature arrives under a different key, the buffered batch is handed to a
//! [`BatchSink`] and the buffer restarts under the new key. This is a
//! single-pass partition, not a general group-by: it relies on the input being
//! grouped contiguously by key.
//!
//! What happens when a key comes back after it was flushed is governed by
//! [`OrderingPolicy`]. Under [`OrderingPolicy::AssumeContiguous`] the later
//! batch is flushed separately and merged by the sink; under
//! [`OrderingPolicy::RequireContiguous`] the run fails with
//! [`SplitError::GroupReappeared`].

use crate::error::SplitError;
use crate::feature::Feature;
use anyhow::Result;
use std::collections::BTreeSet;

/// Destination for completed batches.
pub trait BatchSink {
    /// Persist `batch` for `key` and return the group's total feature count
    /// after the write.
    fn write_batch(&mut self, key: &str, batch: Vec<Feature>) -> Result<usize>;
}

/// Contract on the ordering of groups in the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderingPolicy {
    /// Accept re-appearing groups; they are merged into the existing output
    /// at the cost of another read-modify-write.
    #[default]
    AssumeContiguous,
    /// Fail the run when a group re-appears after being flushed.
    RequireContiguous,
}

/// Outcome of one flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flushed {
    pub key: String,
    pub added: usize,
    pub total: usize,
}

/// Buffer for the current group's features.
#[derive(Debug, Default)]
pub struct BatchAccumulator {
    ordering: OrderingPolicy,
    current: Option<String>,
    batch: Vec<Feature>,
    flushed: BTreeSet<String>,
    reappeared: usize,
}

impl BatchAccumulator {
    #[must_use]
    pub fn new(ordering: OrderingPolicy) -> Self {
        Self {
            ordering,
            ..Self::default()
        }
    }

    /// Key of the batch being accumulated.
    #[must_use]
    pub fn current_key(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Number of features waiting in the buffer.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.batch.len()
    }

    /// How many times a group came back after it had been flushed.
    #[must_use]
    pub fn reappearances(&self) -> usize {
        self.reappeared
    }

    /// Add a classified feature. Flushes the previous group first when `key`
    /// differs from the current one.
    ///
    /// # Errors
    ///
    /// Propagates sink failures, and returns [`SplitError::GroupReappeared`]
    /// under [`OrderingPolicy::RequireContiguous`].
    pub fn push<S: BatchSink + ?Sized>(
        &mut self,
        key: &str,
        feature: Feature,
        sink: &mut S,
    ) -> Result<Option<Flushed>> {
        let mut flushed = None;
        if self.current.as_deref() != Some(key) {
            flushed = self.flush(sink)?;
            if self.flushed.contains(key) {
                match self.ordering {
                    OrderingPolicy::RequireContiguous => {
                        return Err(SplitError::GroupReappeared {
                            key: key.to_string(),
                        }
                        .into());
                    }
                    OrderingPolicy::AssumeContiguous => {
                        self.reappeared += 1;
                        log::warn!("group {key:?} re-appeared; merging into its existing output");
                    }
                }
            }
            self.current = Some(key.to_string());
        }
        self.batch.push(feature);
        Ok(flushed)
    }

    /// Flush whatever is buffered at end of input.
    ///
    /// # Errors
    ///
    /// Propagates sink failures.
    pub fn finish<S: BatchSink + ?Sized>(mut self, sink: &mut S) -> Result<Option<Flushed>> {
        self.flush(sink)
    }

    fn flush<S: BatchSink + ?Sized>(&mut self, sink: &mut S) -> Result<Option<Flushed>> {
        let Some(key) = self.current.take() else {
            return Ok(None);
        };
        if self.batch.is_empty() {
            return Ok(None);
        }
        let batch = std::mem::take(&mut self.batch);
        let added = batch.len();
        let total = sink.write_batch(&key, batch)?;
        self.flushed.insert(key.clone());
        Ok(Some(Flushed { key, added, total }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        writes: Vec<(String, usize)>,
    }

    impl BatchSink for Recorder {
        fn write_batch(&mut self, key: &str, batch: Vec<Feature>) -> Result<usize> {
            self.writes.push((key.to_string(), batch.len()));
            Ok(self
                .writes
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, n)| n)
                .sum())
        }
    }

    fn f(i: u32) -> Feature {
        serde_json::from_value(json!({"id": i})).unwrap()
    }

    #[test]
    fn flushes_on_key_change_and_at_end() -> Result<()> {
        let mut sink = Recorder::default();
        let mut acc = BatchAccumulator::new(OrderingPolicy::AssumeContiguous);
        assert!(acc.push("a", f(1), &mut sink)?.is_none());
        assert!(acc.push("a", f(2), &mut sink)?.is_none());
        assert_eq!(acc.buffered(), 2);

        let flushed = acc.push("b", f(3), &mut sink)?.unwrap();
        assert_eq!(
            flushed,
            Flushed {
                key: "a".into(),
                added: 2,
                total: 2
            }
        );
        assert_eq!(acc.current_key(), Some("b"));
        assert_eq!(acc.buffered(), 1);

        let last = acc.finish(&mut sink)?.unwrap();
        assert_eq!(last.key, "b");
        assert_eq!(sink.writes, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
        Ok(())
    }

    #[test]
    fn finish_on_empty_accumulator_writes_nothing() -> Result<()> {
        let mut sink = Recorder::default();
        let acc = BatchAccumulator::default();
        assert!(acc.finish(&mut sink)?.is_none());
        assert!(sink.writes.is_empty());
        Ok(())
    }

    #[test]
    fn reappearing_group_is_merged_when_assumed_contiguous() -> Result<()> {
        let mut sink = Recorder::default();
        let mut acc = BatchAccumulator::new(OrderingPolicy::AssumeContiguous);
        acc.push("a", f(1), &mut sink)?;
        acc.push("b", f(2), &mut sink)?;
        acc.push("a", f(3), &mut sink)?;
        assert_eq!(acc.reappearances(), 1);
        let last = acc.finish(&mut sink)?.unwrap();
        assert_eq!(last.total, 2);
        assert_eq!(
            sink.writes,
            vec![("a".to_string(), 1), ("b".to_string(), 1), ("a".to_string(), 1)]
        );
        Ok(())
    }

    #[test]
    fn reappearing_group_fails_when_required_contiguous() -> Result<()> {
        let mut sink = Recorder::default();
        let mut acc = BatchAccumulator::new(OrderingPolicy::RequireContiguous);
        acc.push("a", f(1), &mut sink)?;
        acc.push("b", f(2), &mut sink)?;
        let err = acc.push("a", f(3), &mut sink).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SplitError>(),
            Some(SplitError::GroupReappeared { key }) if key == "a"
        ));
        // "b" was still flushed before the violation was reported.
        assert_eq!(sink.writes, vec![("a".to_string(), 1), ("b".to_string(), 1)]);
        Ok(())
    }
}
