//! Aggregator - folds fan-out outcomes into one answer

use contracts::{ApiKind, ContractError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::fanout::Mailbox;

/// Drain every mailbox in index order and fold the successes with `merge`
///
/// - The first success seeds the result, later ones are merged into it
/// - Errors are counted; the last one is kept as the representative cause
/// - Zero successes with at least one error → [`ContractError::AllBackendsFailed`]
/// - No mailboxes at all → `empty`, the operation's empty answer
/// - `cancel` firing → [`ContractError::Cancelled`] immediately, without
///   waiting for outstanding units
///
/// A merge error aborts the fold and is returned as is.
pub async fn aggregate<T, M>(
    api: ApiKind,
    cancel: &CancellationToken,
    mailboxes: Vec<Mailbox<T>>,
    empty: T,
    mut merge: M,
) -> Result<T, ContractError>
where
    M: FnMut(T, T) -> Result<T, ContractError>,
{
    let total = mailboxes.len();
    let mut merged: Option<T> = None;
    let mut last_error: Option<ContractError> = None;
    let mut error_count = 0usize;

    for (index, mailbox) in mailboxes.into_iter().enumerate() {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(api = %api, collected = index, total, "Call cancelled by caller");
                return Err(ContractError::Cancelled);
            }
            outcome = mailbox => outcome.unwrap_or_else(|_| {
                Err(ContractError::backend(format!(
                    "backend {index} terminated before reporting"
                )))
            }),
        };

        match outcome {
            Ok(value) => {
                merged = Some(match merged.take() {
                    None => value,
                    Some(acc) => merge(acc, value)?,
                });
            }
            Err(err) => {
                error_count += 1;
                last_error = Some(err);
            }
        }
    }

    match (merged, last_error) {
        (Some(value), _) => {
            if error_count > 0 {
                debug!(api = %api, failed = error_count, total, "Partial success, dropping backend errors");
            }
            Ok(value)
        }
        (None, Some(err)) => {
            warn!(api = %api, total, error = %err, "All backends failed");
            Err(ContractError::all_backends_failed(err))
        }
        (None, None) => Ok(empty),
    }
}
