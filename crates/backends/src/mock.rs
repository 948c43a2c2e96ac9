//! Mock backend
//!
//! Scripted implementation for tests, with failure and latency injection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use contracts::{
    Backend, CancellationToken, ContractError, LabelSet, LabelValue, QueryRange, Value,
};
use tracing::{instrument, trace};

/// Mock backend configuration (failure scenarios can be injected)
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Answer of `label_values`
    pub label_values: Vec<LabelValue>,
    /// Answer of `series`
    pub series: Vec<LabelSet>,
    /// Answer of `query`
    pub query: Value,
    /// Answer of `query_range`
    pub query_range: Value,
    /// Fail every call with this message
    pub fail_with: Option<String>,
    /// Latency added before answering
    pub delay: Duration,
    /// Keep sleeping through cancellation
    pub ignore_cancellation: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            label_values: Vec::new(),
            series: Vec::new(),
            query: Value::Vector(Vec::new()),
            query_range: Value::Matrix(Vec::new()),
            fail_with: None,
            delay: Duration::ZERO,
            ignore_cancellation: false,
        }
    }
}

/// Mock backend
///
/// Clones share their call counters, so a test can keep a handle while the
/// original is moved into a federation.
#[derive(Debug, Clone)]
pub struct MockBackend {
    name: String,
    config: Arc<MockConfig>,
    calls: Arc<AtomicU64>,
    cancellations: Arc<AtomicU64>,
}

impl MockBackend {
    /// Create a mock answering every call with an empty result
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, MockConfig::default())
    }

    /// Create a mock from configuration
    pub fn with_config(name: impl Into<String>, config: MockConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            calls: Arc::new(AtomicU64::new(0)),
            cancellations: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_label_values(self, values: Vec<LabelValue>) -> Self {
        self.configure(|c| c.label_values = values)
    }

    pub fn with_series(self, series: Vec<LabelSet>) -> Self {
        self.configure(|c| c.series = series)
    }

    pub fn with_query(self, value: Value) -> Self {
        self.configure(|c| c.query = value)
    }

    pub fn with_query_range(self, value: Value) -> Self {
        self.configure(|c| c.query_range = value)
    }

    /// Fail every call with a backend error
    pub fn failing(self, message: impl Into<String>) -> Self {
        let message = message.into();
        self.configure(|c| c.fail_with = Some(message))
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        self.configure(|c| c.delay = delay)
    }

    /// Simulate a client that does not honor cancellation
    pub fn ignoring_cancellation(self) -> Self {
        self.configure(|c| c.ignore_cancellation = true)
    }

    /// Backend name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of calls received (all operations)
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    /// Number of calls abandoned because of cancellation
    pub fn cancellations(&self) -> u64 {
        self.cancellations.load(Ordering::Relaxed)
    }

    fn configure(mut self, apply: impl FnOnce(&mut MockConfig)) -> Self {
        apply(Arc::make_mut(&mut self.config));
        self
    }

    /// Common call prologue: count, wait, fail
    async fn respond<T: Clone>(
        &self,
        cancel: &CancellationToken,
        answer: &T,
    ) -> Result<T, ContractError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if !self.config.delay.is_zero() {
            if self.config.ignore_cancellation {
                tokio::time::sleep(self.config.delay).await;
            } else {
                tokio::select! {
                    _ = tokio::time::sleep(self.config.delay) => {}
                    _ = cancel.cancelled() => {
                        self.cancellations.fetch_add(1, Ordering::Relaxed);
                        trace!(backend = %self.name, "Mock call cancelled");
                        return Err(ContractError::Cancelled);
                    }
                }
            }
        }

        match &self.config.fail_with {
            Some(message) => Err(ContractError::backend(format!("{}: {message}", self.name))),
            None => Ok(answer.clone()),
        }
    }
}

impl Backend for MockBackend {
    #[instrument(name = "mock_label_values", skip(self, cancel), fields(backend = %self.name))]
    async fn label_values(
        &self,
        cancel: &CancellationToken,
        label: &str,
    ) -> Result<Vec<LabelValue>, ContractError> {
        self.respond(cancel, &self.config.label_values).await
    }

    #[instrument(name = "mock_query", skip(self, cancel, _time), fields(backend = %self.name))]
    async fn query(
        &self,
        cancel: &CancellationToken,
        query: &str,
        _time: DateTime<Utc>,
    ) -> Result<Value, ContractError> {
        self.respond(cancel, &self.config.query).await
    }

    #[instrument(name = "mock_query_range", skip(self, cancel, _range), fields(backend = %self.name))]
    async fn query_range(
        &self,
        cancel: &CancellationToken,
        query: &str,
        _range: QueryRange,
    ) -> Result<Value, ContractError> {
        self.respond(cancel, &self.config.query_range).await
    }

    #[instrument(name = "mock_series", skip_all, fields(backend = %self.name))]
    async fn series(
        &self,
        cancel: &CancellationToken,
        _matchers: &[String],
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<LabelSet>, ContractError> {
        self.respond(cancel, &self.config.series).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::label_set;

    #[tokio::test]
    async fn test_mock_scripted_answers() {
        let mock = MockBackend::new("m")
            .with_label_values(vec!["a".into()])
            .with_series(vec![label_set([("job", "x")])]);
        let cancel = CancellationToken::new();

        assert_eq!(mock.label_values(&cancel, "job").await.unwrap(), ["a"]);
        assert_eq!(
            mock.series(&cancel, &[], Utc::now(), Utc::now()).await.unwrap(),
            vec![label_set([("job", "x")])]
        );
        assert_eq!(
            mock.query_range(
                &cancel,
                "up",
                QueryRange::new(Utc::now(), Utc::now(), Duration::from_secs(1))
            )
            .await
            .unwrap(),
            Value::Matrix(vec![])
        );
        assert_eq!(mock.calls(), 3);
    }

    #[tokio::test]
    async fn test_mock_failure_names_backend() {
        let mock = MockBackend::new("prom-b").failing("connection refused");
        let err = mock
            .label_values(&CancellationToken::new(), "job")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "backend error: prom-b: connection refused");
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_honors_cancellation() {
        let mock = MockBackend::new("slow").with_delay(Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = mock.label_values(&cancel, "job").await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(mock.cancellations(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_can_ignore_cancellation() {
        let mock = MockBackend::new("stubborn")
            .with_delay(Duration::from_secs(60))
            .ignoring_cancellation()
            .with_label_values(vec!["v".into()]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let values = mock.label_values(&cancel, "job").await.unwrap();
        assert_eq!(values, ["v"]);
        assert_eq!(mock.cancellations(), 0);
    }

    #[test]
    fn test_clones_share_counters() {
        let mock = MockBackend::new("m");
        let handle = mock.clone();
        mock.calls.fetch_add(2, Ordering::Relaxed);
        assert_eq!(handle.calls(), 2);
    }
}
