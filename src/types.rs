use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// One unit of work: a single (host, port) pair to probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScanTask {
    pub host: String,
    pub port: u16,
}

impl ScanTask {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ScanTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Open,
    Closed,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanStatus::Open => write!(f, "open"),
            ScanStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Result of probing one `ScanTask`. Created once, by the worker that ran it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub task: ScanTask,
    pub status: ScanStatus,
    pub banner: Option<String>,
    pub attempts: u32,
    pub elapsed: Duration,
}

impl ScanOutcome {
    pub fn is_open(&self) -> bool {
        self.status == ScanStatus::Open
    }

    /// Outcome for a task that was dequeued after cancellation and never dialed.
    pub fn skipped(task: ScanTask) -> Self {
        Self {
            task,
            status: ScanStatus::Closed,
            banner: None,
            attempts: 0,
            elapsed: Duration::ZERO,
        }
    }
}

/// Totals for a finished scan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanSummary {
    pub targets_scanned: usize,
    pub ports_scanned: usize,
    pub open_count: usize,
    pub duration: Duration,
    pub cancelled: bool,
}

/// Everything handed to the presentation layer once the worker pool has drained.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub summary: ScanSummary,
    pub outcomes: Vec<ScanOutcome>,
    /// RFC 3339 wall-clock time at which enumeration started.
    pub started_at: String,
}
