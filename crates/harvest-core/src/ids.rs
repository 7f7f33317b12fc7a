//! Unordered product-id accumulation with a sorted view at serialization time.

use std::collections::HashSet;

/// Set of product ids collected while walking a listing.
///
/// Insertion order is irrelevant and nothing is kept sorted while ids arrive;
/// [`ProductIdSet::to_sorted_vec`] produces the ascending, duplicate-free
/// sequence stored in a `CategoryDataset`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductIdSet {
    ids: HashSet<u64>,
}

impl ProductIdSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Union `other` into `self`, returning how many ids were new.
    pub fn merge(&mut self, other: &ProductIdSet) -> usize {
        let before = self.ids.len();
        self.ids.extend(other.ids.iter().copied());
        self.ids.len() - before
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn to_sorted_vec(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl FromIterator<u64> for ProductIdSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl Extend<u64> for ProductIdSet {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        self.ids.extend(iter);
    }
}
