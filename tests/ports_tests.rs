use portprobe::error::ConfigError;
use portprobe::ports::PortSet;
use std::fs;

#[test]
fn unparsable_list_entry_does_not_stop_the_scan() {
    let mut ports = PortSet::new();
    let skipped = ports.add_list("abc,80");
    assert_eq!(ports.iter().collect::<Vec<_>>(), vec![80]);
    assert_eq!(skipped, vec!["abc"]);
}

#[test]
fn ports_file_is_unioned_with_range() {
    let path = std::env::temp_dir().join(format!("portprobe-ports-{}.txt", std::process::id()));
    fs::write(&path, "21-23\n# mail\n25\n").unwrap();

    let mut ports = PortSet::from_range(20, 22).unwrap();
    ports.add_file(&path).unwrap();
    let _ = fs::remove_file(&path);

    assert_eq!(ports.iter().collect::<Vec<_>>(), vec![20, 21, 22, 23, 25]);
}

#[test]
fn missing_ports_file_is_config_error() {
    let mut ports = PortSet::new();
    let err = ports
        .add_file("/nonexistent/portprobe/ports.txt")
        .unwrap_err();
    assert!(matches!(err, ConfigError::PortsFile { .. }));
}

#[test]
fn bad_line_in_ports_file_is_config_error() {
    let path = std::env::temp_dir().join(format!("portprobe-bad-{}.txt", std::process::id()));
    fs::write(&path, "22\nhttp\n").unwrap();

    let mut ports = PortSet::new();
    let err = ports.add_file(&path).unwrap_err();
    let _ = fs::remove_file(&path);

    match err {
        ConfigError::PortsFile { reason, .. } => assert!(reason.contains("line 2")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(ports.is_empty());
}
