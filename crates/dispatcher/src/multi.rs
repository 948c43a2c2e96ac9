//! MultiBackend - a backend backed by N backends

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use contracts::{
    ApiKind, Backend, ContractError, LabelSet, LabelValue, MetricFn, QueryRange, Value,
};
use merge_engine::{merge_label_sets, merge_label_values, merge_values};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::aggregate::aggregate;
use crate::fanout::fan_out;

/// Fan-out proxy over a fixed set of backends
///
/// Every call is sent to all backends concurrently; the successful answers
/// are merged, failed backends are ignored as long as one succeeds. Holds
/// only immutable configuration, so one instance serves any number of
/// concurrent calls.
pub struct MultiBackend<B> {
    backends: Vec<Arc<B>>,
    anti_affinity: Duration,
    metric_fn: Option<MetricFn>,
}

impl<B> MultiBackend<B> {
    /// Create a proxy over `backends`
    ///
    /// Range-query samples of one series closer than `anti_affinity` are
    /// treated as duplicates.
    pub fn new(backends: Vec<B>, anti_affinity: Duration) -> Self {
        Self::from_shared(backends.into_iter().map(Arc::new).collect(), anti_affinity)
    }

    /// Create a proxy over backends shared with other owners
    pub fn from_shared(backends: Vec<Arc<B>>, anti_affinity: Duration) -> Self {
        Self {
            backends,
            anti_affinity,
            metric_fn: None,
        }
    }

    /// Attach the per-backend metric hook
    pub fn with_metric_fn(mut self, metric_fn: MetricFn) -> Self {
        self.metric_fn = Some(metric_fn);
        self
    }

    /// Number of backends
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    /// True if no backend is configured
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Backend at `index`
    pub fn backend(&self, index: usize) -> Option<&Arc<B>> {
        self.backends.get(index)
    }

    /// Anti-affinity window used for range merges
    pub fn anti_affinity(&self) -> Duration {
        self.anti_affinity
    }
}

impl<B> fmt::Debug for MultiBackend<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiBackend")
            .field("backends", &self.backends.len())
            .field("anti_affinity", &self.anti_affinity)
            .field("metric_fn", &self.metric_fn.is_some())
            .finish()
    }
}

impl<B> MultiBackend<B>
where
    B: Backend + Sync + 'static,
{
    /// Run one logical call: fan out, then aggregate
    ///
    /// Units run under a child of `cancel` that is also cancelled when this
    /// call returns, so no unit outlives the call. `empty` is the answer of a
    /// proxy with no backends.
    #[instrument(
        name = "multi_backend_call",
        skip_all,
        fields(api = %api, backends = self.backends.len())
    )]
    async fn call<T, F, Fut, M>(
        &self,
        api: ApiKind,
        cancel: &CancellationToken,
        request: F,
        empty: T,
        merge: M,
    ) -> Result<T, ContractError>
    where
        T: Send + 'static,
        F: Fn(Arc<B>, CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, ContractError>> + Send + 'static,
        M: FnMut(T, T) -> Result<T, ContractError>,
    {
        let scope = cancel.child_token();
        let _scope_guard = scope.clone().drop_guard();

        let mailboxes = fan_out(&self.backends, api, &scope, self.metric_fn.as_ref(), request);
        aggregate(api, cancel, mailboxes, empty, merge).await
    }
}

impl<B> Backend for MultiBackend<B>
where
    B: Backend + Sync + 'static,
{
    async fn label_values(
        &self,
        cancel: &CancellationToken,
        label: &str,
    ) -> Result<Vec<LabelValue>, ContractError> {
        let label: Arc<str> = Arc::from(label);
        self.call(
            ApiKind::LabelValues,
            cancel,
            move |backend, token| {
                let label = Arc::clone(&label);
                async move { backend.label_values(&token, &label).await }
            },
            Vec::new(),
            |a, b| Ok(merge_label_values(a, b)),
        )
        .await
    }

    async fn query(
        &self,
        cancel: &CancellationToken,
        query: &str,
        time: DateTime<Utc>,
    ) -> Result<Value, ContractError> {
        let query: Arc<str> = Arc::from(query);
        let anti_affinity = self.anti_affinity;
        self.call(
            ApiKind::Query,
            cancel,
            move |backend, token| {
                let query = Arc::clone(&query);
                async move { backend.query(&token, &query, time).await }
            },
            Value::Vector(Vec::new()),
            |a, b| Ok(merge_values(anti_affinity, a, b)?),
        )
        .await
    }

    async fn query_range(
        &self,
        cancel: &CancellationToken,
        query: &str,
        range: QueryRange,
    ) -> Result<Value, ContractError> {
        let query: Arc<str> = Arc::from(query);
        let anti_affinity = self.anti_affinity;
        self.call(
            ApiKind::QueryRange,
            cancel,
            move |backend, token| {
                let query = Arc::clone(&query);
                async move { backend.query_range(&token, &query, range).await }
            },
            Value::Matrix(Vec::new()),
            |a, b| Ok(merge_values(anti_affinity, a, b)?),
        )
        .await
    }

    async fn series(
        &self,
        cancel: &CancellationToken,
        matchers: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LabelSet>, ContractError> {
        let matchers: Arc<[String]> = Arc::from(matchers);
        self.call(
            ApiKind::Series,
            cancel,
            move |backend, token| {
                let matchers = Arc::clone(&matchers);
                async move { backend.series(&token, &matchers, start, end).await }
            },
            Vec::new(),
            |a, b| Ok(merge_label_sets(a, b)),
        )
        .await
    }
}
