//! Feature records and the `FeatureCollection` envelope.
//!
//! A [`Feature`] keeps the decoded JSON object verbatim (key order included,
//! via `serde_json`'s `preserve_order`), so a feature written back to disk is
//! the same object that was read. Only the few paths needed for routing are
//! exposed as typed accessors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `type` tag of a persisted collection.
pub const FEATURE_COLLECTION: &str = "FeatureCollection";

/// One decoded feature object.
///
/// Deserialization only succeeds for JSON objects; arrays, scalars and
/// malformed text are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Feature(Map<String, Value>);

impl Feature {
    /// The `properties` object, if present and an object.
    #[must_use]
    pub fn properties(&self) -> Option<&Map<String, Value>> {
        self.0.get("properties").and_then(Value::as_object)
    }

    /// The group descriptors under `properties.skiAreas`.
    ///
    /// A missing or non-array `skiAreas` reads as an empty list.
    #[must_use]
    pub fn ski_areas(&self) -> &[Value] {
        self.properties()
            .and_then(|p| p.get("skiAreas"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// `properties.name` of every group descriptor that has one, in order.
    pub fn ski_area_names(&self) -> impl Iterator<Item = &str> {
        self.ski_areas().iter().filter_map(descriptor_name)
    }
}

/// `properties.name` of one group descriptor.
pub(crate) fn descriptor_name(descriptor: &Value) -> Option<&str> {
    descriptor
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
}

/// The on-disk document for one group: `{"type": ..., "features": [...]}`.
///
/// Both fields default when absent so that a partially valid document on disk
/// still reads as a (possibly empty) collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "collection_type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

fn collection_type() -> String {
    FEATURE_COLLECTION.to_string()
}

impl FeatureCollection {
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: collection_type(),
            features,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
