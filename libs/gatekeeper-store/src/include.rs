//! Eager-include specifications.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Relations to preload alongside fetched entities, nested to any depth.
///
/// Serialized as a mapping, e.g. `{"pages": {"margin_notes": {}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
#[must_use]
pub struct Include(BTreeMap<String, Include>);

impl Include {
    /// Preload nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Adds `relation`, preloading `nested` beneath it.
    pub fn with(mut self, relation: impl Into<String>, nested: Include) -> Self {
        self.0.insert(relation.into(), nested);
        self
    }

    /// Adds `relation` with nothing beneath it.
    pub fn relation(self, relation: impl Into<String>) -> Self {
        self.with(relation, Self::none())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Include)> {
        self.0.iter().map(|(name, nested)| (name.as_str(), nested))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
