use crate::error::ConfigError;
use ipnet::IpNet;
use std::collections::HashSet;
use std::net::IpAddr;

/// Largest CIDR block we are willing to expand into individual hosts.
pub const MAX_CIDR_HOSTS: u64 = 65_536;

/// Resolve the host list from the single-target and target-list options.
///
/// A non-empty single target wins over the list. List entries are trimmed and
/// empty entries dropped. Entries containing `/` are treated as CIDR blocks and
/// expanded to their host addresses. Order of first appearance is kept and
/// duplicates are removed.
pub fn resolve_targets(
    target: Option<&str>,
    targets: Option<&str>,
) -> Result<Vec<String>, ConfigError> {
    let raw: Vec<&str> = match target.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => vec![t],
        None => targets
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect(),
    };

    let mut seen = HashSet::new();
    let mut hosts = Vec::new();
    for entry in raw {
        let expanded = if entry.contains('/') {
            expand_cidr(entry)?
        } else {
            vec![entry.to_string()]
        };
        for host in expanded {
            if seen.insert(host.clone()) {
                hosts.push(host);
            }
        }
    }

    if hosts.is_empty() {
        return Err(ConfigError::NoTargets);
    }
    Ok(hosts)
}

/// Expand a CIDR string into host addresses.
///
/// For IPv4 blocks larger than /31 the network and broadcast addresses are
/// excluded; /31 and /32 yield every address.
pub fn expand_cidr(cidr: &str) -> Result<Vec<String>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidTarget {
        target: cidr.to_string(),
        reason,
    };
    let net: IpNet = cidr.parse().map_err(|e| invalid(format!("{e}")))?;

    let host_bits = u32::from(net.max_prefix_len() - net.prefix_len());
    if host_bits >= 64 || (1u64 << host_bits) > MAX_CIDR_HOSTS {
        return Err(invalid(format!(
            "block too large (limit is {MAX_CIDR_HOSTS} addresses)"
        )));
    }

    Ok(expand_net(net).into_iter().map(|ip| ip.to_string()).collect())
}

fn expand_net(net: IpNet) -> Vec<IpAddr> {
    net.hosts().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_target_takes_precedence() {
        let hosts = resolve_targets(Some("10.0.0.1"), Some("a,b")).unwrap();
        assert_eq!(hosts, vec!["10.0.0.1"]);
    }

    #[test]
    fn blank_single_target_falls_back_to_list() {
        let hosts = resolve_targets(Some("  "), Some(" a , ,b,a ")).unwrap();
        assert_eq!(hosts, vec!["a", "b"]);
    }

    #[test]
    fn nothing_left_is_no_targets() {
        assert_eq!(resolve_targets(None, Some(" , ,")), Err(ConfigError::NoTargets));
        assert_eq!(resolve_targets(None, None), Err(ConfigError::NoTargets));
    }

    #[test]
    fn small_cidr_excludes_network_and_broadcast() {
        let hosts = expand_cidr("192.168.1.0/30").unwrap();
        assert_eq!(hosts, vec!["192.168.1.1", "192.168.1.2"]);
    }

    #[test]
    fn huge_cidr_is_rejected() {
        assert!(matches!(
            expand_cidr("10.0.0.0/8"),
            Err(ConfigError::InvalidTarget { .. })
        ));
        assert!(matches!(
            expand_cidr("not-a-net/24"),
            Err(ConfigError::InvalidTarget { .. })
        ));
    }
}
