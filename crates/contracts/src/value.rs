//! Query result model
//!
//! Mirrors the Prometheus result shapes: scalar, instant vector, range
//! matrix and string.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::LabelSet;

/// Sample timestamp, Unix epoch milliseconds
pub type Timestamp = i64;

/// Convert a wall-clock time into a sample timestamp
pub fn timestamp_ms(time: DateTime<Utc>) -> Timestamp {
    time.timestamp_millis()
}

/// A single (timestamp, value) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Epoch milliseconds
    pub timestamp: Timestamp,
    /// Sample value
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// One series of an instant vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstantSample {
    pub metric: LabelSet,
    pub sample: Sample,
}

/// One series of a range matrix
///
/// `values` is sorted ascending by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleStream {
    pub metric: LabelSet,
    pub values: Vec<Sample>,
}

/// String result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringValue {
    pub timestamp: Timestamp,
    pub value: String,
}

/// Result of an instant or range query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
pub enum Value {
    Scalar(Sample),
    Vector(Vec<InstantSample>),
    Matrix(Vec<SampleStream>),
    String(StringValue),
}

impl Value {
    /// Shape of this value
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Scalar(_) => ValueType::Scalar,
            Value::Vector(_) => ValueType::Vector,
            Value::Matrix(_) => ValueType::Matrix,
            Value::String(_) => ValueType::String,
        }
    }

    /// Number of series carried (1 for scalar and string)
    pub fn series_count(&self) -> usize {
        match self {
            Value::Vector(v) => v.len(),
            Value::Matrix(m) => m.len(),
            Value::Scalar(_) | Value::String(_) => 1,
        }
    }
}

/// An empty instant vector, returned when no backend is configured
impl Default for Value {
    fn default() -> Self {
        Value::Vector(Vec::new())
    }
}

/// Result shape discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Scalar,
    Vector,
    Matrix,
    String,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Scalar => "scalar",
            ValueType::Vector => "vector",
            ValueType::Matrix => "matrix",
            ValueType::String => "string",
        };
        f.write_str(name)
    }
}

/// Time range of a range query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Resolution step
    pub step: Duration,
}

impl QueryRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, step: Duration) -> Self {
        Self { start, end, step }
    }

    /// Whether a sample timestamp falls inside `[start, end]`
    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= timestamp_ms(self.start) && ts <= timestamp_ms(self.end)
    }
}
