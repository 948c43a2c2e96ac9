//! Label model
//!
//! A series is identified by its label set. `BTreeMap` keeps the pairs in a
//! canonical order, so two label sets compare and hash equal iff they hold
//! identical name/value pairs.

use std::collections::BTreeMap;

/// Label name (e.g. `job`)
pub type LabelName = String;

/// Label value (e.g. `api-server`)
pub type LabelValue = String;

/// Unordered name -> value mapping identifying one series
pub type LabelSet = BTreeMap<LabelName, LabelValue>;

/// Reserved label carrying the metric name
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Build a label set from `(name, value)` pairs
///
/// # Examples
/// ```
/// use contracts::label_set;
///
/// let ls = label_set([("__name__", "up"), ("job", "node")]);
/// assert_eq!(ls.get("job").map(String::as_str), Some("node"));
/// ```
pub fn label_set<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> LabelSet {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Metric name of a label set, if present
pub fn metric_name(labels: &LabelSet) -> Option<&str> {
    labels.get(METRIC_NAME_LABEL).map(String::as_str)
}
