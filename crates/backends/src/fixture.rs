//! Fixture backend
//!
//! Serves answers from a JSON snapshot, so a federation can be exercised
//! offline. Snapshot layout:
//!
//! ```json
//! {
//!   "label_values": { "job": ["api", "node"] },
//!   "series": [ { "__name__": "up", "job": "api" } ],
//!   "instant": { "up": { "resultType": "vector", "result": [] } },
//!   "range": { "up": { "resultType": "matrix", "result": [] } }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use contracts::{
    metric_name, Backend, CancellationToken, ContractError, LabelSet, LabelValue, QueryRange,
    Value,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Snapshot of one backend's answers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    /// Label name → values
    pub label_values: HashMap<String, Vec<LabelValue>>,
    /// Every known series
    pub series: Vec<LabelSet>,
    /// Query text → instant result
    pub instant: HashMap<String, Value>,
    /// Query text → range result
    pub range: HashMap<String, Value>,
}

/// Backend answering from a [`Fixture`]
#[derive(Debug, Clone)]
pub struct FixtureBackend {
    name: String,
    fixture: Fixture,
}

impl FixtureBackend {
    /// Load a fixture file
    pub fn load(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self, ContractError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let content = std::fs::read_to_string(path)
            .map_err(|e| ContractError::fixture_load(&shown, e.to_string()))?;
        let fixture: Fixture = serde_json::from_str(&content)
            .map_err(|e| ContractError::fixture_load(&shown, e.to_string()))?;

        let name = name.into();
        debug!(
            backend = %name,
            path = %shown,
            series = fixture.series.len(),
            "Loaded fixture"
        );
        Ok(Self::from_fixture(name, fixture))
    }

    pub fn from_fixture(name: impl Into<String>, fixture: Fixture) -> Self {
        Self {
            name: name.into(),
            fixture,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, cancel: &CancellationToken) -> Result<(), ContractError> {
        if cancel.is_cancelled() {
            return Err(ContractError::Cancelled);
        }
        Ok(())
    }
}

/// Keep only samples inside the requested range
fn trim_to_range(value: Value, range: &QueryRange) -> Value {
    match value {
        Value::Matrix(streams) => Value::Matrix(
            streams
                .into_iter()
                .map(|mut stream| {
                    stream.values.retain(|s| range.contains(s.timestamp));
                    stream
                })
                .filter(|stream| !stream.values.is_empty())
                .collect(),
        ),
        other => other,
    }
}

impl Backend for FixtureBackend {
    #[instrument(name = "fixture_label_values", skip(self, cancel), fields(backend = %self.name))]
    async fn label_values(
        &self,
        cancel: &CancellationToken,
        label: &str,
    ) -> Result<Vec<LabelValue>, ContractError> {
        self.check(cancel)?;
        Ok(self
            .fixture
            .label_values
            .get(label)
            .cloned()
            .unwrap_or_default())
    }

    #[instrument(name = "fixture_query", skip(self, cancel, _time), fields(backend = %self.name))]
    async fn query(
        &self,
        cancel: &CancellationToken,
        query: &str,
        _time: DateTime<Utc>,
    ) -> Result<Value, ContractError> {
        self.check(cancel)?;
        Ok(self.fixture.instant.get(query).cloned().unwrap_or_default())
    }

    #[instrument(name = "fixture_query_range", skip(self, cancel, range), fields(backend = %self.name))]
    async fn query_range(
        &self,
        cancel: &CancellationToken,
        query: &str,
        range: QueryRange,
    ) -> Result<Value, ContractError> {
        self.check(cancel)?;
        Ok(match self.fixture.range.get(query) {
            Some(value) => trim_to_range(value.clone(), &range),
            None => Value::Matrix(Vec::new()),
        })
    }

    #[instrument(name = "fixture_series", skip(self, cancel, _start, _end), fields(backend = %self.name))]
    async fn series(
        &self,
        cancel: &CancellationToken,
        matchers: &[String],
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<LabelSet>, ContractError> {
        self.check(cancel)?;
        Ok(self
            .fixture
            .series
            .iter()
            .filter(|labels| {
                matchers.is_empty()
                    || metric_name(labels).is_some_and(|name| matchers.iter().any(|m| m == name))
            })
            .cloned()
            .collect())
    }
}
