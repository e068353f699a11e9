use portprobe::error::ConfigError;
use portprobe::targets::{expand_cidr, resolve_targets};

#[test]
fn list_is_trimmed_and_deduplicated() {
    let hosts = resolve_targets(None, Some(" scanme.example , 10.0.0.1,,10.0.0.1 ")).unwrap();
    assert_eq!(hosts, vec!["scanme.example", "10.0.0.1"]);
}

#[test]
fn cidr_entries_expand_to_hosts() {
    let hosts = resolve_targets(None, Some("10.0.0.0/30,10.0.0.2")).unwrap();
    assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2"]);
}

#[test]
fn slash_32_is_a_single_host() {
    assert_eq!(expand_cidr("192.0.2.7/32").unwrap(), vec!["192.0.2.7"]);
}

#[test]
fn empty_resolution_is_fatal() {
    assert_eq!(resolve_targets(Some(""), Some("")), Err(ConfigError::NoTargets));
}
