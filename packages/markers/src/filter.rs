//! Active feature filters.

use std::collections::BTreeSet;

use location_insight_metrics_models::FeatureTag;

/// The set of feature tags currently shown on the map.
///
/// Only changed by explicit user toggles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet(BTreeSet<FeatureTag>);

impl FilterSet {
    /// A filter set with no tag active.
    #[must_use]
    pub const fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Flips `tag` and returns whether it is now active.
    pub fn toggle(&mut self, tag: FeatureTag) -> bool {
        if self.0.remove(&tag) {
            false
        } else {
            self.0.insert(tag);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, tag: FeatureTag) -> bool {
        self.0.contains(&tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = FeatureTag> + '_ {
        self.0.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        FeatureTag::DEFAULT_ACTIVE.iter().copied().collect()
    }
}

impl FromIterator<FeatureTag> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FeatureTag>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
