//! Stable name → id assignment for categories.

use std::collections::{BTreeSet, HashMap};

use harvest_core::{CategoryEntry, CategoryRegistry, ConsolidatedIndex};

pub const REGISTRY_DESCRIPTION: &str =
    "Category ID mappings generated from consolidated product data";

/// Assigns ids `1..=n` to the distinct category names in `index`, in
/// lexicographic order of the names.
#[must_use]
pub fn build_registry(index: &ConsolidatedIndex, generated_at: String) -> CategoryRegistry {
    let names: BTreeSet<&str> = index
        .products
        .values()
        .flatten()
        .map(String::as_str)
        .collect();

    let categories = names
        .into_iter()
        .zip(1u32..)
        .map(|(name, id)| CategoryEntry {
            id,
            name: name.to_owned(),
        })
        .collect();

    CategoryRegistry {
        categories,
        generated_at,
        description: REGISTRY_DESCRIPTION.to_owned(),
    }
}

/// Name → id lookup over a registry.
#[must_use]
pub fn registry_lookup(registry: &CategoryRegistry) -> HashMap<&str, u32> {
    registry
        .categories
        .iter()
        .map(|entry| (entry.name.as_str(), entry.id))
        .collect()
}
