//! Per-call metric attribution
//!
//! The fan-out core reports one observation per backend per logical call
//! through an injected [`MetricFn`]. Exporting is left to the hook.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Backend operation name used for metric attribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKind {
    LabelValues,
    Query,
    QueryRange,
    Series,
}

impl ApiKind {
    pub const ALL: [ApiKind; 4] = [
        ApiKind::LabelValues,
        ApiKind::Query,
        ApiKind::QueryRange,
        ApiKind::Series,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKind::LabelValues => "label_values",
            ApiKind::Query => "query",
            ApiKind::QueryRange => "query_range",
            ApiKind::Series => "series",
        }
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Success,
    Error,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Success => "success",
            CallStatus::Error => "error",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metric hook type
///
/// Invoked exactly once per backend per logical call with
/// `(backend index, operation, status, elapsed seconds)`. Purely
/// observational; it never influences the call result.
pub type MetricFn = Arc<dyn Fn(usize, ApiKind, CallStatus, f64) + Send + Sync>;
