use crate::error::ConfigError;
use anyhow::{ensure, Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Set of TCP ports (1..=65535) built from a contiguous range and explicit entries.
///
/// Union semantics: adding a port twice has no effect. Iteration is ascending but
/// callers should not depend on that for anything beyond stable output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSet {
    ports: BTreeSet<u16>,
}

impl PortSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive range `[start, end]`. Errors if `end < start`.
    pub fn from_range(start: u16, end: u16) -> Result<Self, ConfigError> {
        let mut set = Self::new();
        set.add_range(start, end)?;
        Ok(set)
    }

    pub fn add_range(&mut self, start: u16, end: u16) -> Result<(), ConfigError> {
        if end < start {
            return Err(ConfigError::InvalidPortRange { start, end });
        }
        self.ports.extend((start..=end).filter(|&p| p != 0));
        Ok(())
    }

    pub fn insert(&mut self, port: u16) -> bool {
        port != 0 && self.ports.insert(port)
    }

    /// Union in a comma-separated list such as `"22,80,8000-8002"`.
    ///
    /// Malformed entries are skipped with a warning; they never fail the scan.
    /// Returns the skipped entries.
    pub fn add_list(&mut self, list: &str) -> Vec<String> {
        let mut skipped = Vec::new();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match parse_entry(entry) {
                Ok((start, end)) => self.ports.extend(start..=end),
                Err(e) => {
                    warn!("skipping port entry '{entry}': {e}");
                    skipped.push(entry.to_string());
                }
            }
        }
        skipped
    }

    /// Union in the contents of a ports file. See [`parse_ports_file`] for the format.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let file_error = |reason: String| ConfigError::PortsFile {
            path: path.display().to_string(),
            reason,
        };
        let content = fs::read_to_string(path).map_err(|e| file_error(e.to_string()))?;
        let parsed = parse_ports_file(&content).map_err(|e| file_error(format!("{e:#}")))?;
        self.ports.extend(parsed.ports);
        Ok(())
    }

    pub fn contains(&self, port: u16) -> bool {
        self.ports.contains(&port)
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.ports.iter().copied()
    }
}

impl FromIterator<u16> for PortSet {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        let mut set = Self::new();
        for p in iter {
            set.insert(p);
        }
        set
    }
}

/// Ports file format: one port (`80`) or inclusive range (`8000-8010`) per line.
/// Text after `#` is a comment; blank lines are ignored.
///
/// Unlike the command-line list, a bad line here fails the whole file.
pub fn parse_ports_file(content: &str) -> Result<PortSet> {
    let mut set = PortSet::new();
    let entries = content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.split('#').next().unwrap_or("").trim()))
        .filter(|(_, entry)| !entry.is_empty());
    for (line_no, entry) in entries {
        let (start, end) = parse_entry(entry).with_context(|| format!("line {line_no}"))?;
        set.ports.extend(start..=end);
    }
    Ok(set)
}

/// A single port or an inclusive `start-end` range.
fn parse_entry(entry: &str) -> Result<(u16, u16)> {
    match entry.split_once('-') {
        Some((lo, hi)) => {
            let (start, end) = (parse_port(lo)?, parse_port(hi)?);
            ensure!(start <= end, "range {start}-{end} runs backwards");
            Ok((start, end))
        }
        None => parse_port(entry).map(|p| (p, p)),
    }
}

fn parse_port(raw: &str) -> Result<u16> {
    let raw = raw.trim();
    let port: u16 = raw
        .parse()
        .with_context(|| format!("'{raw}' is not a port number"))?;
    ensure!(port != 0, "port 0 is not scannable");
    Ok(port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_and_list_union_without_duplicates() {
        let mut set = PortSet::from_range(1, 5).unwrap();
        let skipped = set.add_list("3,4,6");
        assert!(skipped.is_empty());
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn inverted_range_is_config_error() {
        let err = PortSet::from_range(100, 10).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPortRange { start: 100, end: 10 });
    }

    #[test]
    fn single_port_range() {
        let set = PortSet::from_range(443, 443).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains(443));
    }

    #[test]
    fn malformed_list_entries_are_skipped() {
        let mut set = PortSet::new();
        let skipped = set.add_list("abc,80, ,0,70000,90-85,8000-8001");
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![80, 8000, 8001]);
        assert_eq!(skipped, vec!["abc", "0", "70000", "90-85"]);
    }

    #[test]
    fn file_with_comments_and_overlap() {
        let content = "# web\n8000-8002 # dev\n\n80\n  8001\n";
        let set = parse_ports_file(content).unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![80, 8000, 8001, 8002]);
    }

    #[test]
    fn file_error_names_the_line() {
        let err = parse_ports_file("22\nssh\n").unwrap_err();
        assert!(format!("{err:#}").starts_with("line 2"));
        assert!(parse_ports_file("70000\n").is_err());
        assert!(parse_ports_file("0\n").is_err());
        assert!(parse_ports_file("90-80\n").is_err());
    }
}
