//! # Merge Engine
//!
//! Pure, stateless merge algorithms combining two partial results of a
//! fan-out call into one.
//!
//! Handles:
//! - Label value union (`merge_label_values`)
//! - Label set union (`merge_label_sets`)
//! - Query result merge with anti-affinity deduplication (`merge_values`)
//!
//! ## Example
//!
//! ```
//! use contracts::{label_set, Sample, SampleStream, Value};
//! use merge_engine::merge_values;
//! use std::time::Duration;
//!
//! let series = |values: Vec<Sample>| {
//!     Value::Matrix(vec![SampleStream {
//!         metric: label_set([("__name__", "up")]),
//!         values,
//!     }])
//! };
//!
//! let a = series(vec![Sample::new(0, 1.0), Sample::new(60_000, 2.0)]);
//! let b = series(vec![Sample::new(500, 1.0), Sample::new(65_000, 2.0)]);
//!
//! let merged = merge_values(Duration::from_secs(5), a, b).unwrap();
//! let Value::Matrix(streams) = merged else { unreachable!() };
//! assert_eq!(streams[0].values.len(), 2);
//! ```

mod error;
mod labels;
mod value;

pub use error::MergeError;
pub use labels::{merge_label_sets, merge_label_values};
pub use value::{merge_samples, merge_values};
