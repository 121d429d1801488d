//! Utility functions for skisplit.

use regex::Regex;
use std::sync::LazyLock;

/// Token used when a key sanitizes to nothing.
pub const UNNAMED: &str = "unnamed";

static NON_ALNUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[^A-Za-z0-9]+").expect("static pattern"));

/// Derive a filesystem-legal name from a group key.
///
/// Every run of characters outside `[A-Za-z0-9]` collapses to a single `_`,
/// leading and trailing `_` are trimmed, and an empty result becomes
/// [`UNNAMED`].
///
/// # Examples
///
/// ```
/// use skisplit::utils::sanitize_key;
///
/// assert_eq!(sanitize_key("Palisades Tahoe / Olympic Valley"), "Palisades_Tahoe_Olympic_Valley");
/// assert_eq!(sanitize_key("  ///  "), "unnamed");
/// ```
#[must_use]
pub fn sanitize_key(key: &str) -> String {
    let collapsed = NON_ALNUM_RUN.replace_all(key, "_");
    let trimmed = collapsed.trim_matches('_');
    if trimmed.is_empty() {
        UNNAMED.to_string()
    } else {
        trimmed.to_string()
    }
}
