//! # skisplit
//!
//! Partition an oversized GeoJSON `FeatureCollection` of ski runs and lifts
//! into one collection per ski area, without holding the input in memory.
//!
//! ## How it works
//!
//! - [`scanner`] finds successive object boundaries in the raw text by
//!   counting braces, rather than parsing the whole document
//! - [`decoder`] parses each object on its own; a malformed object is skipped
//! - [`classify`] reads the group key from the first `properties.skiAreas`
//!   descriptor and checks it against an [`AllowList`]
//! - [`accumulator`] buffers the current group and flushes when the key changes,
//!   relying on the input being grouped by ski area
//! - [`writer`] merges each flushed batch into the group's existing file and
//!   rewrites it atomically
//!
//! The [`select`] module is the eager alternative: it loads the whole document
//! and writes one filtered collection for a single group.
//!
//! ## Quick start
//!
//! ```no_run
//! use skisplit::{SplitConfig, split_file};
//! # fn main() -> anyhow::Result<()> {
//! let config = SplitConfig::new("out/");
//! let summary = split_file("runs.geojson", &config)?;
//! println!("{} features into {} files", summary.features_routed, summary.groups.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Known limitations
//!
//! - With [`BoundaryMode::Naive`] (the default), braces inside string values
//!   corrupt object boundaries. Use [`BoundaryMode::StringAware`] when string
//!   values may contain `{` or `}`.
//! - Groups must be contiguous in the input. A group that re-appears is merged
//!   at extra I/O cost, or rejected under [`OrderingPolicy::RequireContiguous`].
//! - Merging is additive: running twice over the same input doubles each
//!   group's features.
//!
//! ## Feature Flags
//!
//! - `compression-gzip` - read `.gz` inputs
//! - `compression-zstd` - read `.zst` inputs

pub mod accumulator;
pub mod classify;
pub mod decoder;
pub mod error;
pub mod feature;
pub mod io;
pub mod pipeline;
pub mod scanner;
pub mod select;
pub mod summary;
pub mod testing;
pub mod utils;
pub mod writer;

pub use accumulator::{BatchAccumulator, BatchSink, Flushed, OrderingPolicy};
pub use classify::{AllowList, Classification, classify};
pub use decoder::decode_feature;
pub use error::SplitError;
pub use feature::{Feature, FeatureCollection};
pub use pipeline::{SplitConfig, split_file, split_files, split_reader};
pub use scanner::{BoundaryMode, BoundaryScanner, RawSlice};
pub use select::{SelectSummary, select_group};
pub use summary::SplitSummary;
pub use utils::sanitize_key;
pub use writer::{FlushOutcome, MergeWriter};
