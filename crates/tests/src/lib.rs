//! # Integration Tests
//!
//! Cross-crate tests, no live backend required.
//!
//! Covers:
//! - federation behaviour under partial and total failure
//! - merge results as seen through `MultiBackend`
//! - configuration + fixture loading end to end

#[cfg(test)]
mod federation_tests {
    use std::error::Error;
    use std::time::Duration;

    use backends::MockBackend;
    use chrono::{DateTime, Utc};
    use contracts::{
        label_set, Backend, CancellationToken, ContractError, InstantSample, LabelSet, QueryRange,
        Sample, SampleStream, Value,
    };
    use dispatcher::{cancel_after, MultiBackend};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn range() -> QueryRange {
        QueryRange::new(at(0), at(120), Duration::from_secs(60))
    }

    fn up_matrix(points: &[(i64, f64)]) -> Value {
        Value::Matrix(vec![SampleStream {
            metric: label_set([("__name__", "up"), ("job", "node")]),
            values: points.iter().map(|&(t, v)| Sample::new(t, v)).collect(),
        }])
    }

    /// k < N failures: the answer is the merge of the successes
    #[tokio::test]
    async fn test_partial_failure_merges_successes() {
        for failing in 0..4 {
            let backends = (0..4)
                .map(|i| {
                    let mock = MockBackend::new(format!("b{i}"))
                        .with_label_values(strings(&[&format!("v{i}")]));
                    if i < failing {
                        mock.failing("unavailable")
                    } else {
                        mock
                    }
                })
                .collect();
            let proxy = MultiBackend::new(backends, Duration::ZERO);

            let values = proxy
                .label_values(&CancellationToken::new(), "job")
                .await
                .unwrap();

            let expected: Vec<String> = (failing..4).map(|i| format!("v{i}")).collect();
            assert_eq!(values, expected, "with {failing} failing backends");
        }
    }

    /// N failures: one error carrying the last backend error as its cause
    #[tokio::test]
    async fn test_total_failure_is_an_error() {
        let proxy = MultiBackend::new(
            vec![
                MockBackend::new("a").failing("refused"),
                MockBackend::new("b").failing("timeout"),
            ],
            Duration::ZERO,
        );

        let err = proxy
            .series(&CancellationToken::new(), &[], at(0), at(60))
            .await
            .unwrap_err();

        assert!(matches!(err, ContractError::AllBackendsFailed { .. }));
        assert!(err.to_string().starts_with("unable to fetch from downstream servers"));
        let cause = err.source().unwrap();
        assert_eq!(cause.to_string(), "backend error: b: timeout");
    }

    /// N = 0: empty results, not errors
    #[tokio::test]
    async fn test_no_backends_yield_empty_results() {
        let proxy: MultiBackend<MockBackend> = MultiBackend::new(Vec::new(), Duration::ZERO);
        let cancel = CancellationToken::new();

        assert!(proxy.label_values(&cancel, "job").await.unwrap().is_empty());
        assert!(proxy
            .series(&cancel, &[], at(0), at(60))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            proxy.query(&cancel, "up", at(0)).await.unwrap(),
            Value::Vector(vec![])
        );
        assert_eq!(
            proxy.query_range(&cancel, "up", range()).await.unwrap(),
            Value::Matrix(vec![])
        );
    }

    /// An empty member federation contributes nothing and merges cleanly
    #[tokio::test]
    async fn test_empty_member_federation_beside_full_one() {
        let instant = Value::Vector(vec![InstantSample {
            metric: label_set([("__name__", "up"), ("job", "node")]),
            sample: Sample::new(0, 1.0),
        }]);
        let full = MultiBackend::new(
            vec![MockBackend::new("a")
                .with_query(instant.clone())
                .with_query_range(up_matrix(&[(0, 1.0), (60_000, 1.0)]))],
            Duration::ZERO,
        );
        let global = MultiBackend::new(
            vec![MultiBackend::new(Vec::new(), Duration::ZERO), full],
            Duration::ZERO,
        );
        let cancel = CancellationToken::new();

        assert_eq!(global.query(&cancel, "up", at(0)).await.unwrap(), instant);
        assert_eq!(
            global.query_range(&cancel, "up", range()).await.unwrap(),
            up_matrix(&[(0, 1.0), (60_000, 1.0)])
        );
    }

    #[tokio::test]
    async fn test_label_values_scenario() {
        let proxy = MultiBackend::new(
            vec![
                MockBackend::new("a").with_label_values(strings(&["up", "down"])),
                MockBackend::new("b").with_label_values(strings(&["down", "stalled"])),
            ],
            Duration::from_secs(10),
        );

        let mut values = proxy
            .label_values(&CancellationToken::new(), "state")
            .await
            .unwrap();
        values.sort();
        assert_eq!(values, strings(&["down", "stalled", "up"]));
    }

    #[tokio::test]
    async fn test_series_scenario() {
        let series: Vec<LabelSet> = vec![
            label_set([("__name__", "up"), ("job", "api")]),
            label_set([("__name__", "up"), ("job", "db")]),
        ];
        let proxy = MultiBackend::new(
            vec![
                MockBackend::new("a").failing("connection reset"),
                MockBackend::new("b").with_series(series.clone()),
            ],
            Duration::from_secs(10),
        );

        let result = proxy
            .series(&CancellationToken::new(), &strings(&["up"]), at(0), at(60))
            .await
            .unwrap();
        assert_eq!(result, series);
    }

    #[tokio::test]
    async fn test_range_merge_window() {
        let replicas = || {
            vec![
                MockBackend::new("a").with_query_range(up_matrix(&[(0, 1.0), (60_000, 2.0)])),
                MockBackend::new("b").with_query_range(up_matrix(&[(500, 1.0), (65_000, 2.0)])),
            ]
        };
        let cancel = CancellationToken::new();

        let dedup = MultiBackend::new(replicas(), Duration::from_secs(5))
            .query_range(&cancel, "up", range())
            .await
            .unwrap();
        assert_eq!(dedup, up_matrix(&[(0, 1.0), (60_000, 2.0)]));

        let raw = MultiBackend::new(replicas(), Duration::ZERO)
            .query_range(&cancel, "up", range())
            .await
            .unwrap();
        assert_eq!(
            raw,
            up_matrix(&[(0, 1.0), (500, 1.0), (60_000, 2.0), (65_000, 2.0)])
        );
    }

    /// Merged output does not depend on backend order
    #[tokio::test]
    async fn test_backend_order_does_not_change_series_set() {
        let a = vec![label_set([("job", "a")]), label_set([("job", "b")])];
        let b = vec![label_set([("job", "b")]), label_set([("job", "c")])];
        let cancel = CancellationToken::new();

        let forward = MultiBackend::new(
            vec![
                MockBackend::new("a").with_series(a.clone()),
                MockBackend::new("b").with_series(b.clone()),
            ],
            Duration::ZERO,
        );
        let backward = MultiBackend::new(
            vec![
                MockBackend::new("b").with_series(b),
                MockBackend::new("a").with_series(a),
            ],
            Duration::ZERO,
        );

        let mut x = forward.series(&cancel, &[], at(0), at(1)).await.unwrap();
        let mut y = backward.series(&cancel, &[], at(0), at(1)).await.unwrap();
        x.sort();
        y.sort();
        assert_eq!(x, y);
        assert_eq!(x.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_any_backend_responds() {
        let slow = MockBackend::new("slow").with_delay(Duration::from_secs(600));
        let handle = slow.clone();
        let proxy = MultiBackend::new(
            vec![slow, MockBackend::new("stuck").with_delay(Duration::from_secs(600))],
            Duration::ZERO,
        );

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = proxy.label_values(&cancel, "job").await.unwrap_err();
        assert!(err.is_cancelled());
        // Surfaced verbatim, not wrapped
        assert!(matches!(err, ContractError::Cancelled));

        // A call cancelled up front never reaches its backends
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(handle.calls(), 0);
        assert_eq!(handle.cancellations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cancels_call() {
        let proxy = MultiBackend::new(
            vec![MockBackend::new("slow").with_delay(Duration::from_secs(600))],
            Duration::ZERO,
        );

        let cancel = CancellationToken::new();
        cancel_after(cancel.clone(), Duration::from_millis(200));

        let started = tokio::time::Instant::now();
        let err = proxy.query(&cancel, "up", at(0)).await.unwrap_err();

        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    /// Slow but successful backends are waited for when nothing cancels
    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_contributes() {
        let proxy = MultiBackend::new(
            vec![
                MockBackend::new("fast").with_label_values(strings(&["a"])),
                MockBackend::new("slow")
                    .with_delay(Duration::from_secs(30))
                    .with_label_values(strings(&["b"])),
            ],
            Duration::ZERO,
        );

        let values = proxy
            .label_values(&CancellationToken::new(), "job")
            .await
            .unwrap();
        assert_eq!(values, strings(&["a", "b"]));
    }
}

#[cfg(test)]
mod metrics_tests {
    use std::time::Duration;

    use backends::MockBackend;
    use chrono::{DateTime, Utc};
    use contracts::{
        ApiKind, Backend, CancellationToken, ContractError, LabelSet, LabelValue, QueryRange,
        Value,
    };
    use dispatcher::MultiBackend;
    use observability::BackendCallStats;

    /// Federation member that is either a working mock or crashes on every call
    enum Member {
        Healthy(MockBackend),
        Crashing,
    }

    impl Backend for Member {
        async fn label_values(
            &self,
            cancel: &CancellationToken,
            label: &str,
        ) -> Result<Vec<LabelValue>, ContractError> {
            match self {
                Member::Healthy(mock) => mock.label_values(cancel, label).await,
                Member::Crashing => panic!("label_values crashed"),
            }
        }

        async fn query(
            &self,
            cancel: &CancellationToken,
            query: &str,
            time: DateTime<Utc>,
        ) -> Result<Value, ContractError> {
            match self {
                Member::Healthy(mock) => mock.query(cancel, query, time).await,
                Member::Crashing => panic!("query crashed"),
            }
        }

        async fn query_range(
            &self,
            cancel: &CancellationToken,
            query: &str,
            range: QueryRange,
        ) -> Result<Value, ContractError> {
            match self {
                Member::Healthy(mock) => mock.query_range(cancel, query, range).await,
                Member::Crashing => panic!("query_range crashed"),
            }
        }

        async fn series(
            &self,
            cancel: &CancellationToken,
            matchers: &[String],
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<LabelSet>, ContractError> {
            match self {
                Member::Healthy(mock) => mock.series(cancel, matchers, start, end).await,
                Member::Crashing => panic!("series crashed"),
            }
        }
    }

    #[tokio::test]
    async fn test_crashing_backend_is_counted_as_error() {
        let stats = BackendCallStats::new(vec!["crash".into(), "ok".into()]);
        let proxy = MultiBackend::new(
            vec![
                Member::Crashing,
                Member::Healthy(MockBackend::new("ok").with_label_values(vec!["api".into()])),
            ],
            Duration::ZERO,
        )
        .with_metric_fn(stats.hook());

        let values = proxy
            .label_values(&CancellationToken::new(), "job")
            .await
            .unwrap();
        assert_eq!(values, ["api"]);

        let summary = stats.summary();
        assert_eq!(summary.total_calls(), 2);
        assert_eq!(summary.backends[0].name, "crash");
        assert_eq!(summary.backends[0].errors, 1);
        assert_eq!(summary.backends[1].successes, 1);
    }

    #[tokio::test]
    async fn test_all_crashing_backends_fail_the_call() {
        let stats = BackendCallStats::new(Vec::new());
        let proxy = MultiBackend::new(vec![Member::Crashing, Member::Crashing], Duration::ZERO)
            .with_metric_fn(stats.hook());

        let err = proxy
            .query(&CancellationToken::new(), "up", Utc::now())
            .await
            .unwrap_err();

        match err {
            ContractError::AllBackendsFailed { source } => {
                assert!(source.to_string().contains("backend 1 task failed"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(stats.summary().total_errors(), 2);
    }

    #[tokio::test]
    async fn test_stats_hook_sees_every_backend_once_per_call() {
        let stats = BackendCallStats::new(vec!["a".into(), "b".into(), "c".into()]);
        let proxy = MultiBackend::new(
            vec![
                MockBackend::new("a"),
                MockBackend::new("b").failing("down"),
                MockBackend::new("c"),
            ],
            Duration::ZERO,
        )
        .with_metric_fn(stats.hook());

        let cancel = CancellationToken::new();
        for _ in 0..3 {
            proxy.label_values(&cancel, "job").await.unwrap();
        }

        let summary = stats.summary();
        assert_eq!(summary.total_calls(), 9);
        assert_eq!(summary.total_errors(), 3);
        assert_eq!(summary.backends[1].name, "b");
        assert_eq!(summary.backends[1].errors, 3);
        assert_eq!(
            summary.backends[0].per_api.get(&ApiKind::LabelValues),
            Some(&3)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hook_fires_for_cancelled_units() {
        let stats = BackendCallStats::new(Vec::new());
        let proxy = MultiBackend::new(
            vec![
                MockBackend::new("slow")
                    .with_delay(Duration::from_secs(600))
                    .ignoring_cancellation(),
            ],
            Duration::ZERO,
        )
        .with_metric_fn(stats.hook());

        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(proxy.label_values(&cancel, "job").await.is_err());

        // The unit observes the call scope ending and reports
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(stats.summary().total_errors(), 1);
    }
}

#[cfg(test)]
mod fixture_tests {
    use std::io::Write;
    use std::path::Path;
    use std::time::Duration;

    use backends::FixtureBackend;
    use chrono::DateTime;
    use config_loader::ConfigLoader;
    use contracts::{Backend, CancellationToken, QueryRange, Value};
    use dispatcher::MultiBackend;

    const REPLICA_A: &str = r#"{
        "label_values": { "job": ["api", "node"] },
        "series": [{ "__name__": "up", "job": "api" }],
        "range": {
            "up": { "resultType": "matrix", "result": [
                { "metric": { "__name__": "up", "job": "api" },
                  "values": [
                      { "timestamp": 0, "value": 1.0 },
                      { "timestamp": 60000, "value": 1.0 }
                  ] }
            ] }
        }
    }"#;

    const REPLICA_B: &str = r#"{
        "label_values": { "job": ["node", "db"] },
        "series": [
            { "__name__": "up", "job": "api" },
            { "__name__": "up", "job": "db" }
        ],
        "range": {
            "up": { "resultType": "matrix", "result": [
                { "metric": { "__name__": "up", "job": "api" },
                  "values": [
                      { "timestamp": 1500, "value": 1.0 },
                      { "timestamp": 61500, "value": 1.0 },
                      { "timestamp": 121500, "value": 0.0 }
                  ] }
            ] }
        }
    }"#;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::File::create(dir.join(name))
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
    }

    fn load_federation(dir: &Path) -> MultiBackend<FixtureBackend> {
        let config = ConfigLoader::load_from_path(&dir.join("promfed.toml")).unwrap();
        let backends = config
            .backends
            .iter()
            .map(|b| FixtureBackend::load(&b.name, b.fixture_path()).unwrap())
            .collect();
        MultiBackend::new(backends, config.anti_affinity())
    }

    #[tokio::test]
    async fn test_config_to_merged_answers() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", REPLICA_A);
        write(dir.path(), "b.json", REPLICA_B);
        write(
            dir.path(),
            "promfed.toml",
            r#"
anti_affinity_ms = 5000

[[backends]]
name = "prom-a"
fixture = "a.json"

[[backends]]
name = "prom-b"
fixture = "b.json"
"#,
        );

        let proxy = load_federation(dir.path());
        let cancel = CancellationToken::new();
        let start = DateTime::from_timestamp(0, 0).unwrap();
        let end = DateTime::from_timestamp(180, 0).unwrap();

        let jobs = proxy.label_values(&cancel, "job").await.unwrap();
        assert_eq!(jobs, ["api", "node", "db"]);

        let series = proxy
            .series(&cancel, &["up".to_string()], start, end)
            .await
            .unwrap();
        assert_eq!(series.len(), 2);

        let value = proxy
            .query_range(
                &cancel,
                "up",
                QueryRange::new(start, end, Duration::from_secs(60)),
            )
            .await
            .unwrap();
        let Value::Matrix(streams) = value else {
            panic!("expected matrix");
        };
        let ts: Vec<_> = streams[0].values.iter().map(|s| s.timestamp).collect();
        // Replica B fills the gap at ~120s, duplicates collapse
        assert_eq!(ts, [0, 60_000, 121_500]);
    }

    #[tokio::test]
    async fn test_missing_fixture_file_fails_only_that_backend_at_load() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.json", REPLICA_A);

        let ok = FixtureBackend::load("prom-a", dir.path().join("a.json"));
        let missing = FixtureBackend::load("prom-b", dir.path().join("b.json"));

        assert!(ok.is_ok());
        assert!(missing.is_err());
    }
}
