use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::{DEFAULT_VARIATION, VariationId};

/// Parent links between graph variations. Every chain ends at the default variation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationHierarchy {
    parents: IndexMap<VariationId, VariationId>,
}

impl VariationHierarchy {
    pub fn with_variation(
        mut self,
        variation: impl Into<VariationId>,
        parent: impl Into<VariationId>,
    ) -> Self {
        self.parents.insert(variation.into(), parent.into());
        self
    }

    pub fn parent(&self, variation: &VariationId) -> Option<&VariationId> {
        self.parents.get(variation)
    }

    /// `variation`, its ancestors from nearest to farthest, and finally the default variation.
    pub fn chain(&self, variation: &VariationId) -> Vec<VariationId> {
        let default = VariationId::from(DEFAULT_VARIATION);
        let mut chain = vec![variation.clone()];
        let mut current = variation;
        while let Some(parent) = self.parents.get(current) {
            if chain.contains(parent) {
                break;
            }
            chain.push(parent.clone());
            current = parent;
        }
        if !chain.contains(&default) {
            chain.push(default);
        }
        chain
    }
}

/// Authored data that may be overridden per variation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariationData<T> {
    entries: IndexMap<VariationId, T>,
}

impl<T> Default for VariationData<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<T> VariationData<T> {
    /// Data for the default variation only.
    pub fn new(default: T) -> Self {
        Self::default().with_variation(DEFAULT_VARIATION, default)
    }

    pub fn with_variation(mut self, variation: impl Into<VariationId>, data: T) -> Self {
        self.entries.insert(variation.into(), data);
        self
    }

    pub fn get(&self, variation: &VariationId) -> Option<&T> {
        self.entries.get(variation)
    }

    /// Data for `variation`, falling back through its parents up to the default variation.
    pub fn resolve(&self, hierarchy: &VariationHierarchy, variation: &VariationId) -> Option<&T> {
        hierarchy
            .chain(variation)
            .iter()
            .find_map(|variation| self.entries.get(variation))
    }
}

/// What a compilation pass is compiling for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilationSettings {
    pub variation_id: VariationId,
    pub variation_hierarchy: VariationHierarchy,
}

impl Default for CompilationSettings {
    fn default() -> Self {
        Self {
            variation_id: DEFAULT_VARIATION.into(),
            variation_hierarchy: VariationHierarchy::default(),
        }
    }
}
