//! Query commands: one logical call against the federation.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use contracts::{Backend, QueryRange};
use serde::Serialize;
use tracing::info;

use crate::cli::{FederationArgs, LabelValuesArgs, QueryArgs, QueryRangeArgs, SeriesArgs};
use crate::federation::Federation;

/// Execute the `label-values` command
pub async fn run_label_values(args: &LabelValuesArgs) -> Result<()> {
    let federation = Federation::load(&args.federation)?;
    let scope = federation.call_scope();

    let values = federation
        .proxy()
        .label_values(scope.token(), &args.label)
        .await
        .map_err(|e| scope.explain(e))
        .with_context(|| format!("label values of '{}'", args.label))?;

    info!(label = %args.label, values = values.len(), "Label values fetched");
    finish(&federation, &args.federation, &values)
}

/// Execute the `query` command
pub async fn run_query(args: &QueryArgs) -> Result<()> {
    let federation = Federation::load(&args.federation)?;
    let scope = federation.call_scope();
    let time = args.time.unwrap_or_else(Utc::now);

    let value = federation
        .proxy()
        .query(scope.token(), &args.query, time)
        .await
        .map_err(|e| scope.explain(e))
        .with_context(|| format!("query '{}'", args.query))?;

    info!(
        query = %args.query,
        result_type = %value.value_type(),
        series = value.series_count(),
        "Query evaluated"
    );
    finish(&federation, &args.federation, &value)
}

/// Execute the `query-range` command
pub async fn run_query_range(args: &QueryRangeArgs) -> Result<()> {
    if args.end < args.start {
        anyhow::bail!("Range end must not be before start");
    }
    if args.step == 0 {
        anyhow::bail!("Step must be positive");
    }

    let federation = Federation::load(&args.federation)?;
    let scope = federation.call_scope();
    let range = QueryRange::new(args.start, args.end, Duration::from_secs(args.step));

    let value = federation
        .proxy()
        .query_range(scope.token(), &args.query, range)
        .await
        .map_err(|e| scope.explain(e))
        .with_context(|| format!("range query '{}'", args.query))?;

    info!(
        query = %args.query,
        result_type = %value.value_type(),
        series = value.series_count(),
        "Range query evaluated"
    );
    finish(&federation, &args.federation, &value)
}

/// Execute the `series` command
pub async fn run_series(args: &SeriesArgs) -> Result<()> {
    let federation = Federation::load(&args.federation)?;
    let scope = federation.call_scope();
    let end = args.end.unwrap_or_else(Utc::now);
    let start = args.start.unwrap_or(DateTime::UNIX_EPOCH);

    let series = federation
        .proxy()
        .series(scope.token(), &args.matchers, start, end)
        .await
        .map_err(|e| scope.explain(e))
        .context("series lookup")?;

    info!(matchers = ?args.matchers, series = series.len(), "Series fetched");
    finish(&federation, &args.federation, &series)
}

/// Print the result as JSON, then the call statistics if requested
fn finish<T: Serialize>(federation: &Federation, args: &FederationArgs, result: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
    println!("{json}");

    if args.stats {
        eprint!("{}", federation.stats().summary());
    }
    Ok(())
}
