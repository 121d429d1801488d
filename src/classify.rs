//! Group classification against the allow-list.

use crate::feature::{Feature, descriptor_name};
use std::collections::BTreeSet;

/// Groups written when no other list is configured.
pub const EMBEDDED_GROUPS: &[&str] = &[
    "Heavenly Mountain Resort",
    "Kirkwood Mountain Resort",
    "Northstar at Tahoe Resort",
];

/// The set of group names the run is allowed to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    names: BTreeSet<String>,
}

impl AllowList {
    /// The embedded list ([`EMBEDDED_GROUPS`]).
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_names(EMBEDDED_GROUPS.iter().copied())
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::embedded()
    }
}

/// Routing decision for one feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Route to this group.
    Routed(String),
    /// No group descriptors, or the first one has no name.
    NoGroup,
    /// The first descriptor names a group outside the allow-list.
    NotAllowed(String),
}

/// Classify a feature by the name of its **first** group descriptor.
///
/// Later descriptors are ignored even when they name other groups.
#[must_use]
pub fn classify(feature: &Feature, allow: &AllowList) -> Classification {
    let Some(name) = feature.ski_areas().first().and_then(descriptor_name) else {
        return Classification::NoGroup;
    };
    if allow.contains(name) {
        Classification::Routed(name.to_string())
    } else {
        Classification::NotAllowed(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_areas(names: &[&str]) -> Feature {
        let areas: Vec<_> = names
            .iter()
            .map(|n| json!({"type": "Feature", "properties": {"name": n}}))
            .collect();
        serde_json::from_value(json!({"properties": {"skiAreas": areas}})).unwrap()
    }

    #[test]
    fn first_descriptor_decides() {
        let allow = AllowList::embedded();
        let f = with_areas(&["Heavenly Mountain Resort", "Somewhere Else"]);
        assert_eq!(
            classify(&f, &allow),
            Classification::Routed("Heavenly Mountain Resort".into())
        );

        let f = with_areas(&["Somewhere Else", "Heavenly Mountain Resort"]);
        assert_eq!(
            classify(&f, &allow),
            Classification::NotAllowed("Somewhere Else".into())
        );
    }

    #[test]
    fn empty_or_missing_descriptors() {
        let allow = AllowList::embedded();
        assert_eq!(classify(&with_areas(&[]), &allow), Classification::NoGroup);
        let bare: Feature = serde_json::from_value(json!({"type": "Feature"})).unwrap();
        assert_eq!(classify(&bare, &allow), Classification::NoGroup);
        let unnamed: Feature =
            serde_json::from_value(json!({"properties": {"skiAreas": [{"properties": {}}]}}))
                .unwrap();
        assert_eq!(classify(&unnamed, &allow), Classification::NoGroup);
    }

    #[test]
    fn custom_allow_list() {
        let allow = AllowList::from_names(["Mammoth Mountain"]);
        assert_eq!(allow.len(), 1);
        assert!(!allow.is_empty());
        assert!(AllowList::from_names(Vec::<String>::new()).is_empty());
        assert_eq!(
            classify(&with_areas(&["Mammoth Mountain"]), &allow),
            Classification::Routed("Mammoth Mountain".into())
        );
        assert!(matches!(
            classify(&with_areas(&["Heavenly Mountain Resort"]), &allow),
            Classification::NotAllowed(_)
        ));
    }
}
