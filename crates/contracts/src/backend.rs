//! Backend trait - the capability interface of one time-series source
//!
//! Both single backends and the fan-out orchestrator implement it, so
//! federations nest.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::{ContractError, LabelSet, LabelValue, QueryRange, Value};

/// Read-only query capability of a time-series backend
///
/// Every operation takes a cancellation token. Implementations should stop
/// work and return [`ContractError::Cancelled`] promptly once it fires.
#[trait_variant::make(Backend: Send)]
pub trait LocalBackend {
    /// All values of the given label
    async fn label_values(
        &self,
        cancel: &CancellationToken,
        label: &str,
    ) -> Result<Vec<LabelValue>, ContractError>;

    /// Evaluate `query` at a single instant
    async fn query(
        &self,
        cancel: &CancellationToken,
        query: &str,
        time: DateTime<Utc>,
    ) -> Result<Value, ContractError>;

    /// Evaluate `query` over a time range
    async fn query_range(
        &self,
        cancel: &CancellationToken,
        query: &str,
        range: QueryRange,
    ) -> Result<Value, ContractError>;

    /// Series matching any of `matchers` between `start` and `end`
    async fn series(
        &self,
        cancel: &CancellationToken,
        matchers: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LabelSet>, ContractError>;
}
