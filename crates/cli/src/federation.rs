//! Federation wiring: configuration → fixture backends → `MultiBackend`.

use std::time::Duration;

use anyhow::{Context, Result};
use backends::FixtureBackend;
use config_loader::{ConfigLoader, FederationConfig};
use dispatcher::{cancel_after, MultiBackend};
use observability::{combine, prometheus_metric_fn, BackendCallStats};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{info, warn};

use crate::cli::FederationArgs;

/// A loaded federation plus its call statistics
pub struct Federation {
    proxy: MultiBackend<FixtureBackend>,
    stats: BackendCallStats,
    timeout: Option<Duration>,
}

impl Federation {
    /// Load configuration, apply CLI overrides and open every fixture
    pub fn load(args: &FederationArgs) -> Result<Self> {
        info!(config = %args.config.display(), "Loading configuration");

        if !args.config.exists() {
            anyhow::bail!("Configuration file not found: {}", args.config.display());
        }

        let mut config = ConfigLoader::load_from_path(&args.config)
            .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

        // Apply CLI overrides
        if let Some(ms) = args.anti_affinity_ms {
            info!(anti_affinity_ms = ms, "Overriding anti-affinity window from CLI");
            config.anti_affinity_ms = ms;
        }
        if let Some(ms) = args.timeout_ms {
            info!(timeout_ms = ms, "Overriding call timeout from CLI");
            config.timeout_ms = Some(ms);
        }

        let federation = Self::from_config(&config)?;

        // Prometheus endpoint (optional)
        if let Some(port) = args.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        Ok(federation)
    }

    /// Build the federation described by `config`
    pub fn from_config(config: &FederationConfig) -> Result<Self> {
        let backends = config
            .backends
            .iter()
            .map(|b| {
                FixtureBackend::load(&b.name, b.fixture_path())
                    .with_context(|| format!("Failed to open backend '{}'", b.name))
            })
            .collect::<Result<Vec<_>>>()?;

        let names = config.backend_names();
        let stats = BackendCallStats::new(names.clone());
        let hook = combine(vec![prometheus_metric_fn(names), stats.hook()]);

        info!(
            backends = backends.len(),
            anti_affinity_ms = config.anti_affinity_ms,
            timeout_ms = ?config.timeout_ms,
            "Federation ready"
        );

        Ok(Self {
            proxy: MultiBackend::new(backends, config.anti_affinity()).with_metric_fn(hook),
            stats,
            timeout: config.timeout(),
        })
    }

    pub fn proxy(&self) -> &MultiBackend<FixtureBackend> {
        &self.proxy
    }

    pub fn stats(&self) -> &BackendCallStats {
        &self.stats
    }

    /// Cancellation scope of one logical call
    ///
    /// The token fires on Ctrl+C/SIGTERM or when the configured deadline
    /// elapses. Dropping the scope cancels it, which also stops the helper
    /// tasks.
    pub fn call_scope(&self) -> CallScope {
        let token = CancellationToken::new();

        if let Some(timeout) = self.timeout {
            cancel_after(token.clone(), timeout);
        }

        let watcher = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown_signal() => {
                    warn!("Received shutdown signal, cancelling call");
                    watcher.cancel();
                }
                _ = watcher.cancelled() => {}
            }
        });

        CallScope {
            token: token.clone(),
            timeout: self.timeout,
            _guard: token.drop_guard(),
        }
    }
}

/// Cancellation token of one logical call
pub struct CallScope {
    token: CancellationToken,
    timeout: Option<Duration>,
    _guard: DropGuard,
}

impl CallScope {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Attach the deadline to a cancellation error
    pub fn explain(&self, err: contracts::ContractError) -> anyhow::Error {
        match (err.is_cancelled(), self.timeout) {
            (true, Some(timeout)) => anyhow::Error::new(err)
                .context(format!("call cancelled (deadline {}ms)", timeout.as_millis())),
            _ => anyhow::Error::new(err),
        }
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
