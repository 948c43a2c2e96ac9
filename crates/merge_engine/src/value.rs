//! Query result merge with anti-affinity deduplication.
//!
//! Redundant backends scrape the same targets at slightly different times.
//! Two samples of one series whose timestamps are within the anti-affinity
//! window are treated as the same measurement and collapse into one.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use contracts::{InstantSample, LabelSet, Sample, SampleStream, Value};
use tracing::trace;

use crate::MergeError;

/// Merge two query results of the same shape
///
/// - Scalar / string: the first input wins
/// - Vector: union by label set, the first input's sample wins on conflict
/// - Matrix: union by label set, shared series are merged with
///   [`merge_samples`]
///
/// # Errors
/// Returns [`MergeError::ShapeMismatch`] when the shapes differ.
pub fn merge_values(anti_affinity: Duration, a: Value, b: Value) -> Result<Value, MergeError> {
    match (a, b) {
        (Value::Scalar(a), Value::Scalar(_)) => Ok(Value::Scalar(a)),
        (Value::String(a), Value::String(_)) => Ok(Value::String(a)),
        (Value::Vector(a), Value::Vector(b)) => Ok(Value::Vector(merge_vectors(a, b))),
        (Value::Matrix(a), Value::Matrix(b)) => {
            Ok(Value::Matrix(merge_matrices(window_ms(anti_affinity), a, b)))
        }
        (a, b) => Err(MergeError::ShapeMismatch {
            left: a.value_type(),
            right: b.value_type(),
        }),
    }
}

/// Merge two timestamp-sorted sample sequences of one series
///
/// Walks both sequences in timestamp order (the first input wins ties) and
/// drops every candidate within `anti_affinity` of the last emitted sample.
/// The output is strictly increasing and no two samples are closer than the
/// window.
pub fn merge_samples(anti_affinity: Duration, a: &[Sample], b: &[Sample]) -> Vec<Sample> {
    merge_samples_ms(window_ms(anti_affinity), a, b)
}

fn window_ms(window: Duration) -> i64 {
    i64::try_from(window.as_millis()).unwrap_or(i64::MAX)
}

fn merge_samples_ms(window: i64, a: &[Sample], b: &[Sample]) -> Vec<Sample> {
    let mut merged: Vec<Sample> = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (0, 0);

    loop {
        let next = match (a.get(i), b.get(j)) {
            (Some(x), Some(y)) if y.timestamp < x.timestamp => {
                j += 1;
                *y
            }
            (Some(x), _) => {
                i += 1;
                *x
            }
            (None, Some(y)) => {
                j += 1;
                *y
            }
            (None, None) => break,
        };

        match merged.last() {
            Some(last) if next.timestamp.saturating_sub(last.timestamp) <= window => {
                trace!(
                    kept = last.timestamp,
                    dropped = next.timestamp,
                    "Sample within anti-affinity window"
                );
            }
            _ => merged.push(next),
        }
    }

    merged
}

fn merge_vectors(a: Vec<InstantSample>, b: Vec<InstantSample>) -> Vec<InstantSample> {
    let mut seen: HashSet<LabelSet> = a.iter().map(|s| s.metric.clone()).collect();
    let mut merged = a;
    merged.extend(b.into_iter().filter(|s| seen.insert(s.metric.clone())));
    merged
}

fn merge_matrices(window: i64, a: Vec<SampleStream>, b: Vec<SampleStream>) -> Vec<SampleStream> {
    let mut merged = a;
    let mut index: HashMap<LabelSet, usize> = merged
        .iter()
        .enumerate()
        .map(|(pos, s)| (s.metric.clone(), pos))
        .collect();

    for stream in b {
        match index.get(&stream.metric) {
            Some(&pos) => {
                let existing = std::mem::take(&mut merged[pos].values);
                merged[pos].values = merge_samples_ms(window, &existing, &stream.values);
            }
            None => {
                index.insert(stream.metric.clone(), merged.len());
                merged.push(stream);
            }
        }
    }

    merged
}
