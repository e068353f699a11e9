use crate::aggregator::ResultAggregator;
use crate::prober::{ConnectionProber, Connector};
use crate::types::{ScanOutcome, ScanTask};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Fixed set of workers draining one shared task queue.
pub struct WorkerPool {
    set: JoinSet<()>,
}

impl WorkerPool {
    /// Spawn `workers` tasks (at least one) pulling from `rx` until it is closed and empty.
    ///
    /// Each dequeued task produces exactly one outcome in `aggregator`. Once `cancel`
    /// fires, remaining tasks are still drained but recorded without being dialed.
    pub fn spawn<C: Connector>(
        workers: usize,
        rx: mpsc::Receiver<ScanTask>,
        prober: Arc<ConnectionProber<C>>,
        aggregator: ResultAggregator,
        total: usize,
        cancel: CancellationToken,
    ) -> Self {
        let rx = Arc::new(Mutex::new(rx));
        let mut set = JoinSet::new();

        for _ in 0..workers.max(1) {
            let rx = rx.clone();
            let prober = prober.clone();
            let aggregator = aggregator.clone();
            let cancel = cancel.clone();

            set.spawn(async move {
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(task) = next else { break };

                    let outcome = if cancel.is_cancelled() {
                        ScanOutcome::skipped(task)
                    } else {
                        prober.probe_with_cancel(task, &cancel).await
                    };
                    let (addr, status) = (outcome.task.to_string(), outcome.status);
                    let progress = aggregator.record(outcome);
                    info!(
                        "scanned {}/{total}: {addr} {status} ({} open so far)",
                        progress.scanned, progress.open
                    );
                }
            });
        }

        Self { set }
    }

    /// Wait for every worker to exit. Errors if any worker panicked.
    pub async fn join(mut self) -> Result<()> {
        let mut first_err = None;
        while let Some(res) = self.set.join_next().await {
            if let Err(e) = res {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(anyhow!("worker task failed: {e}")),
            None => Ok(()),
        }
    }
}
