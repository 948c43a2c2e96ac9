//! Label data union.
//!
//! Both merges keep the first input's order and append unseen entries of the
//! second, so folding in backend index order is reproducible.

use std::collections::HashSet;

use contracts::{LabelSet, LabelValue};

/// Union of two label value lists without duplicates
pub fn merge_label_values(a: Vec<LabelValue>, b: Vec<LabelValue>) -> Vec<LabelValue> {
    let mut seen: HashSet<LabelValue> = HashSet::with_capacity(a.len() + b.len());
    a.into_iter()
        .chain(b)
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Union of two label set lists without duplicates
///
/// Two label sets are equal iff their name/value pairs are identical.
pub fn merge_label_sets(a: Vec<LabelSet>, b: Vec<LabelSet>) -> Vec<LabelSet> {
    let mut seen: HashSet<LabelSet> = HashSet::with_capacity(a.len() + b.len());
    a.into_iter()
        .chain(b)
        .filter(|labels| seen.insert(labels.clone()))
        .collect()
}
