//! Fan-out - one unit of work per backend per logical call

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{ApiKind, CallStatus, ContractError, MetricFn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Single-slot delivery channel of one unit's outcome
pub type Mailbox<T> = oneshot::Receiver<Result<T, ContractError>>;

/// Spawn one unit of work per backend
///
/// Each unit times `call`, races it against `cancel`, reports through the
/// metric hook exactly once and then delivers the outcome into its own
/// mailbox. Delivery never blocks, so units finish independently of the
/// order the mailboxes are drained in.
///
/// The request runs in its own task: a panicking backend is reported as a
/// backend error of its unit, and cancellation aborts the request.
///
/// The returned mailboxes are in backend index order.
pub fn fan_out<B, T, F, Fut>(
    backends: &[Arc<B>],
    api: ApiKind,
    cancel: &CancellationToken,
    metric_fn: Option<&MetricFn>,
    call: F,
) -> Vec<Mailbox<T>>
where
    B: Send + Sync + 'static,
    T: Send + 'static,
    F: Fn(Arc<B>, CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, ContractError>> + Send + 'static,
{
    backends
        .iter()
        .enumerate()
        .map(|(index, backend)| {
            let (tx, rx) = oneshot::channel();
            let token = cancel.clone();
            let metric_fn = metric_fn.cloned();
            let request = call(Arc::clone(backend), token.clone());

            tokio::spawn(async move {
                let start = Instant::now();
                let mut request = tokio::spawn(request);
                let result = tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        request.abort();
                        Err(ContractError::Cancelled)
                    }
                    joined = &mut request => joined.unwrap_or_else(|e| {
                        Err(ContractError::backend(format!("backend {index} task failed: {e}")))
                    }),
                };
                let took = start.elapsed().as_secs_f64();

                let status = match &result {
                    Ok(_) => CallStatus::Success,
                    Err(e) => {
                        debug!(backend = index, api = %api, error = %e, "Backend call failed");
                        CallStatus::Error
                    }
                };
                if let Some(record) = metric_fn {
                    record(index, api, status, took);
                }

                // Receiver is gone once the aggregator has returned
                let _ = tx.send(result);
            });

            rx
        })
        .collect()
}

/// Cancel `token` once `after` elapses
///
/// Expresses a call timeout as a deadline on the same cancellation signal.
/// The timer task exits early if the token is cancelled by someone else.
pub fn cancel_after(token: CancellationToken, after: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(after) => {
                debug!(after_ms = after.as_millis() as u64, "Deadline elapsed, cancelling");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    })
}
