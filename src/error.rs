use thiserror::Error;

/// Fatal configuration problems. Raised before any network activity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no target specified, use --target or --targets")]
    NoTargets,

    #[error("invalid port range {start}-{end} (end before start)")]
    InvalidPortRange { start: u16, end: u16 },

    #[error("invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("ports file {path}: {reason}")]
    PortsFile { path: String, reason: String },

    #[error("worker count must be at least 1")]
    InvalidWorkers,

    #[error("retry count must be at least 1")]
    InvalidAttempts,

    #[error("task queue capacity must be at least 1")]
    InvalidQueueCapacity,
}
