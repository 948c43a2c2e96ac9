//! Backend call metrics
//!
//! Hooks plugged into the per-backend metric callback of a federation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use contracts::{ApiKind, CallStatus, MetricFn};
use metrics::{counter, histogram};

/// Record one backend call outcome into the global `metrics` recorder
pub fn record_backend_call(backend: &str, api: ApiKind, status: CallStatus, seconds: f64) {
    counter!(
        "promfed_backend_requests_total",
        "backend" => backend.to_string(),
        "api" => api.as_str(),
        "status" => status.as_str()
    )
    .increment(1);

    histogram!(
        "promfed_backend_request_duration_seconds",
        "backend" => backend.to_string(),
        "api" => api.as_str(),
        "status" => status.as_str()
    )
    .record(seconds);
}

/// Hook exporting every backend call as Prometheus metrics
///
/// `names[i]` labels backend `i`; indices without a name are labelled with
/// the index itself.
pub fn prometheus_metric_fn(names: Vec<String>) -> MetricFn {
    Arc::new(move |index: usize, api: ApiKind, status: CallStatus, seconds: f64| {
        match names.get(index) {
            Some(name) => record_backend_call(name, api, status, seconds),
            None => record_backend_call(&index.to_string(), api, status, seconds),
        }
    })
}

/// Fan one callback out to several hooks, in order
pub fn combine(hooks: Vec<MetricFn>) -> MetricFn {
    Arc::new(move |index: usize, api: ApiKind, status: CallStatus, seconds: f64| {
        for hook in &hooks {
            hook(index, api, status, seconds);
        }
    })
}

/// In-memory per-backend call statistics
///
/// Cheap to clone; clones share the same counters. Feed it through
/// [`BackendCallStats::hook`].
#[derive(Debug, Clone)]
pub struct BackendCallStats {
    names: Arc<Vec<String>>,
    inner: Arc<Mutex<BTreeMap<usize, BackendEntry>>>,
}

#[derive(Debug, Clone, Default)]
struct BackendEntry {
    successes: u64,
    errors: u64,
    latency: RunningStats,
    per_api: BTreeMap<ApiKind, u64>,
}

impl BackendCallStats {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names: Arc::new(names),
            inner: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Record one call outcome
    pub fn record(&self, index: usize, api: ApiKind, status: CallStatus, seconds: f64) {
        // A poisoned lock only means a panicking recorder; the data is still usable
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let entry = inner.entry(index).or_default();
        match status {
            CallStatus::Success => entry.successes += 1,
            CallStatus::Error => entry.errors += 1,
        }
        entry.latency.push(seconds * 1000.0);
        *entry.per_api.entry(api).or_insert(0) += 1;
    }

    /// Metric hook feeding these statistics
    pub fn hook(&self) -> MetricFn {
        let stats = self.clone();
        Arc::new(move |index: usize, api: ApiKind, status: CallStatus, seconds: f64| {
            stats.record(index, api, status, seconds)
        })
    }

    /// Snapshot of the statistics collected so far
    pub fn summary(&self) -> CallStatsSummary {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let backends = inner
            .iter()
            .map(|(&index, entry)| BackendSummary {
                index,
                name: self
                    .names
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| index.to_string()),
                successes: entry.successes,
                errors: entry.errors,
                latency_ms: StatsSummary::from(&entry.latency),
                per_api: entry.per_api.clone(),
            })
            .collect();
        CallStatsSummary { backends }
    }

    /// Reset all statistics
    pub fn reset(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// Statistics of every backend that has been called
#[derive(Debug, Clone, Default)]
pub struct CallStatsSummary {
    pub backends: Vec<BackendSummary>,
}

impl CallStatsSummary {
    pub fn total_calls(&self) -> u64 {
        self.backends.iter().map(|b| b.successes + b.errors).sum()
    }

    pub fn total_errors(&self) -> u64 {
        self.backends.iter().map(|b| b.errors).sum()
    }
}

/// Statistics of one backend
#[derive(Debug, Clone, Default)]
pub struct BackendSummary {
    pub index: usize,
    pub name: String,
    pub successes: u64,
    pub errors: u64,
    pub latency_ms: StatsSummary,
    pub per_api: BTreeMap<ApiKind, u64>,
}

impl BackendSummary {
    /// Error rate in percent
    pub fn error_rate(&self) -> f64 {
        let total = self.successes + self.errors;
        if total == 0 {
            0.0
        } else {
            self.errors as f64 / total as f64 * 100.0
        }
    }
}

impl fmt::Display for CallStatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Backend Call Summary ===")?;
        writeln!(
            f,
            "Total calls: {} ({} errors)",
            self.total_calls(),
            self.total_errors()
        )?;
        for backend in &self.backends {
            writeln!(
                f,
                "[{}] {}: ok={} err={} ({:.2}%)",
                backend.index,
                backend.name,
                backend.successes,
                backend.errors,
                backend.error_rate()
            )?;
            writeln!(f, "  latency (ms): {}", backend.latency_ms)?;
        }
        Ok(())
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
