//! Library crate for portprobe exposing reusable modules.
pub mod aggregator;
pub mod error;
pub mod logging;
pub mod pool;
pub mod ports;
pub mod prober;
pub mod report;
pub mod scanner;
pub mod targets;
pub mod tasks;
pub mod types;
