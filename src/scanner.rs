use crate::aggregator::ResultAggregator;
use crate::error::ConfigError;
use crate::pool::WorkerPool;
use crate::prober::{Backoff, ConnectionProber, Connector, ProbeSettings, TcpConnector};
use crate::tasks::TaskGenerator;
use crate::types::{ScanReport, ScanSummary};
use ::time::{format_description::well_known, OffsetDateTime};
use anyhow::{bail, Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Scan-wide settings. `Default` matches the command-line defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfig {
    pub workers: usize,
    pub connect_timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub grab_banner: bool,
    pub banner_timeout: Duration,
    /// Capacity of the task queue between enumeration and the workers.
    pub queue_capacity: usize,
    /// Overall deadline; in-flight and queued work is cancelled once it passes.
    pub deadline: Option<Duration>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let probe = ProbeSettings::default();
        Self {
            workers: 200,
            connect_timeout: probe.connect_timeout,
            max_attempts: probe.max_attempts,
            backoff: probe.backoff,
            grab_banner: probe.grab_banner,
            banner_timeout: probe.banner_timeout,
            queue_capacity: 100,
            deadline: None,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidAttempts);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity);
        }
        Ok(())
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            connect_timeout: self.connect_timeout,
            max_attempts: self.max_attempts,
            backoff: self.backoff,
            grab_banner: self.grab_banner,
            banner_timeout: self.banner_timeout,
        }
    }
}

/// Wires task generation, the bounded queue, the worker pool and the aggregator.
pub struct ScanOrchestrator<C = TcpConnector> {
    config: ScanConfig,
    prober: Arc<ConnectionProber<C>>,
}

impl ScanOrchestrator<TcpConnector> {
    pub fn new(config: ScanConfig) -> Result<Self, ConfigError> {
        Self::with_connector(config, TcpConnector)
    }
}

impl<C: Connector> ScanOrchestrator<C> {
    pub fn with_connector(config: ScanConfig, connector: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let prober = Arc::new(ConnectionProber::with_connector(
            connector,
            config.probe_settings(),
        ));
        Ok(Self { config, prober })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan every task from `generator` and block until all of them have an outcome.
    pub async fn run(&self, generator: &TaskGenerator) -> Result<ScanReport> {
        self.run_with_shared(generator, CancellationToken::new(), ResultAggregator::new())
            .await
    }

    /// Variant that accepts a `CancellationToken` to allow external cancellation.
    pub async fn run_with_cancel(
        &self,
        generator: &TaskGenerator,
        cancel: CancellationToken,
    ) -> Result<ScanReport> {
        self.run_with_shared(generator, cancel, ResultAggregator::new())
            .await
    }

    /// Variant that records into a caller-held aggregator so progress can be
    /// watched while the scan runs. The aggregator must be fresh.
    pub async fn run_with_shared(
        &self,
        generator: &TaskGenerator,
        cancel: CancellationToken,
        aggregator: ResultAggregator,
    ) -> Result<ScanReport> {
        let total = generator.len();
        let started_at = now_rfc3339();
        let start = Instant::now();
        let scan_cancel = cancel.child_token();

        let deadline = self.config.deadline.map(|limit| {
            let token = scan_cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = time::sleep(limit) => {
                        warn!("scan deadline of {limit:?} reached, cancelling remaining work");
                        token.cancel();
                    }
                }
            })
        });

        info!(
            "scanning {} target(s) x {} port(s) with {} worker(s)",
            generator.hosts().len(),
            generator.ports().len(),
            self.config.workers
        );

        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        let pool = WorkerPool::spawn(
            self.config.workers,
            rx,
            self.prober.clone(),
            aggregator.clone(),
            total,
            scan_cancel.clone(),
        );

        for task in generator.tasks() {
            tx.send(task)
                .await
                .context("task queue closed before enumeration finished")?;
        }
        // Closing the sender lets workers exit once the queue is empty.
        drop(tx);

        pool.join().await?;
        let duration = start.elapsed();
        let cancelled = scan_cancel.is_cancelled();
        if let Some(handle) = deadline {
            handle.abort();
        }

        let snapshot = aggregator.snapshot();
        if snapshot.outcomes.len() != total {
            bail!(
                "expected {total} outcomes but recorded {}",
                snapshot.outcomes.len()
            );
        }

        let mut outcomes = snapshot.outcomes;
        outcomes.sort_by(|a, b| a.task.cmp(&b.task));

        let summary = ScanSummary {
            targets_scanned: generator.hosts().len(),
            ports_scanned: total,
            open_count: snapshot.open as usize,
            duration,
            cancelled,
        };
        info!(
            "scan finished: {} open of {} in {:.2}s",
            summary.open_count,
            summary.ports_scanned,
            duration.as_secs_f64()
        );

        Ok(ScanReport {
            summary,
            outcomes,
            started_at,
        })
    }
}

/// Convenience wrapper: plain TCP scan of `generator` with `config`.
pub async fn scan_targets(generator: &TaskGenerator, config: ScanConfig) -> Result<ScanReport> {
    ScanOrchestrator::new(config)?.run(generator).await
}

fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
