use crate::error::ConfigError;
use crate::ports::PortSet;
use crate::types::ScanTask;
use std::collections::BTreeSet;

/// Expands hosts × ports into deduplicated scan tasks. Never touches the network.
#[derive(Debug, Clone)]
pub struct TaskGenerator {
    hosts: Vec<String>,
    ports: PortSet,
}

impl TaskGenerator {
    /// Hosts are trimmed; empty entries are dropped. Fails if no host remains.
    pub fn new<I, S>(hosts: I, ports: PortSet) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = hosts
            .into_iter()
            .map(|h| h.as_ref().trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        if unique.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        Ok(Self {
            hosts: unique.into_iter().collect(),
            ports,
        })
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn ports(&self) -> &PortSet {
        &self.ports
    }

    /// Number of tasks `tasks()` will produce.
    pub fn len(&self) -> usize {
        self.hosts.len() * self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The task sequence, sorted by (host, port). Each pair appears once.
    pub fn tasks(&self) -> impl Iterator<Item = ScanTask> + '_ {
        self.hosts.iter().flat_map(move |host| {
            self.ports
                .iter()
                .map(move |port| ScanTask::new(host.as_str(), port))
        })
    }
}
