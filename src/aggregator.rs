use crate::types::ScanOutcome;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Running counters, returned from `record` and readable mid-scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub scanned: u64,
    pub open: u64,
}

/// Outcomes plus counters, taken once the worker pool has finished.
#[derive(Debug, Clone, Default)]
pub struct AggregateSnapshot {
    pub outcomes: Vec<ScanOutcome>,
    pub scanned: u64,
    pub open: u64,
}

#[derive(Debug, Default)]
struct Inner {
    outcomes: Vec<ScanOutcome>,
    progress: Progress,
}

/// Thread-safe collector of scan outcomes.
///
/// Clones share the same state, so one handle can be given to every worker and
/// another kept by whoever wants to watch progress. A single lock guards the
/// outcome list and both counters.
#[derive(Clone, Debug, Default)]
pub struct ResultAggregator {
    inner: Arc<Mutex<Inner>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking worker cannot leave Inner half-updated, so poisoning is ignored.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `outcome` and bump the counters. Returns the counters after the update.
    pub fn record(&self, outcome: ScanOutcome) -> Progress {
        let mut guard = self.lock();
        guard.progress.scanned += 1;
        if outcome.is_open() {
            guard.progress.open += 1;
        }
        guard.outcomes.push(outcome);
        guard.progress
    }

    pub fn progress(&self) -> Progress {
        self.lock().progress
    }

    pub fn snapshot(&self) -> AggregateSnapshot {
        let guard = self.lock();
        AggregateSnapshot {
            outcomes: guard.outcomes.clone(),
            scanned: guard.progress.scanned,
            open: guard.progress.open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ScanStatus, ScanTask};
    use std::time::Duration;

    fn outcome(port: u16, status: ScanStatus) -> ScanOutcome {
        ScanOutcome {
            task: ScanTask::new("h", port),
            status,
            banner: None,
            attempts: 1,
            elapsed: Duration::ZERO,
        }
    }

    #[test]
    fn counters_track_records() {
        let agg = ResultAggregator::new();
        assert_eq!(agg.record(outcome(1, ScanStatus::Open)), Progress { scanned: 1, open: 1 });
        assert_eq!(agg.record(outcome(2, ScanStatus::Closed)), Progress { scanned: 2, open: 1 });

        let snap = agg.snapshot();
        assert_eq!(snap.outcomes.len(), 2);
        assert_eq!(snap.scanned, 2);
        assert_eq!(snap.open, 1);
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let agg = ResultAggregator::new();
        let handles: Vec<_> = (0..8u16)
            .map(|t| {
                let agg = agg.clone();
                std::thread::spawn(move || {
                    for i in 0..250u16 {
                        let status = if i % 5 == 0 { ScanStatus::Open } else { ScanStatus::Closed };
                        agg.record(outcome(t * 1000 + i, status));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let snap = agg.snapshot();
        assert_eq!(snap.scanned, 2000);
        assert_eq!(snap.outcomes.len(), 2000);
        assert_eq!(snap.open, 400);
        assert_eq!(snap.open as usize, snap.outcomes.iter().filter(|o| o.is_open()).count());
    }
}
