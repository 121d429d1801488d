//! Structured decoding of raw slices.
//!
//! A slice that fails to decode is a local, recoverable failure: the caller
//! drops it and keeps scanning.

use crate::feature::Feature;
use crate::scanner::RawSlice;

/// Longest excerpt of a rejected slice kept for log messages.
const EXCERPT_CHARS: usize = 80;

/// Parse one raw slice into a [`Feature`].
///
/// # Errors
///
/// Returns the `serde_json` error when the slice is not a well-formed JSON
/// object.
pub fn decode_feature(slice: &RawSlice) -> Result<Feature, serde_json::Error> {
    serde_json::from_str(&slice.text)
}

/// A short single-line excerpt of a slice for diagnostics.
#[must_use]
pub fn excerpt(slice: &RawSlice) -> String {
    let flat: String = slice
        .text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .take(EXCERPT_CHARS + 1)
        .collect();
    if flat.chars().count() > EXCERPT_CHARS {
        let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
        format!("{cut}...")
    } else {
        flat
    }
}
