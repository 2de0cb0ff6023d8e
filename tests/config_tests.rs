// Config loading and validation tests

use machine_probe::config::AppConfig;
use machine_probe::models::ProbeType;
use std::path::Path;
use std::time::Duration;

const VALID_CONFIG: &str = r#"
[prober]
snapshot_path = "/var/log/installer/machine-config.yaml"

[network]
poll_interval_ms = 250

[storage]
sys_root = "/sys"
probe_types = ["blockdev", "partition"]

[trace]
capacity = 16
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(
        config.prober.snapshot_path.as_deref(),
        Some(Path::new("/var/log/installer/machine-config.yaml"))
    );
    assert_eq!(config.network.poll_interval_ms, 250);
    assert!(config.storage.probe_types.contains(&ProbeType::Partition));
    assert!(!config.storage.probe_types.contains(&ProbeType::Filesystem));
    assert_eq!(config.trace.capacity, 16);
}

#[test]
fn test_empty_config_uses_defaults() {
    let config = AppConfig::load_from_str("").expect("defaults");
    assert!(config.prober.snapshot_path.is_none());
    assert_eq!(config.network.poll_interval_ms, 1000);
    assert_eq!(config.storage.sys_root, Path::new("/sys"));
    assert!(config.storage.probe_types.is_empty());
    assert_eq!(config.trace.capacity, 64);
}

#[test]
fn test_prober_config_carries_mode_and_timing() {
    let prober = AppConfig::load_from_str(VALID_CONFIG)
        .unwrap()
        .prober_config();
    assert!(prober.snapshot_path.is_some());
    assert_eq!(prober.poll_interval, Duration::from_millis(250));
    assert_eq!(prober.trace_capacity, 16);
}

#[test]
fn test_config_validation_rejects_zero_poll_interval() {
    let bad = VALID_CONFIG.replace("poll_interval_ms = 250", "poll_interval_ms = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("network.poll_interval_ms"));
}

#[test]
fn test_config_validation_rejects_empty_snapshot_path() {
    let bad = VALID_CONFIG.replace(
        "snapshot_path = \"/var/log/installer/machine-config.yaml\"",
        "snapshot_path = \"\"",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("prober.snapshot_path"));
}

#[test]
fn test_config_validation_rejects_zero_trace_capacity() {
    let bad = VALID_CONFIG.replace("capacity = 16", "capacity = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("trace.capacity"));
}

#[test]
fn test_config_rejects_unknown_probe_type() {
    let bad = VALID_CONFIG.replace("\"partition\"", "\"tape\"");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_config_loads_from_path() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("machine-probe.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    let config = AppConfig::load_from_path(&path).unwrap();
    assert_eq!(config.network.poll_interval_ms, 250);

    let err = AppConfig::load_from_path(&dir.path().join("missing.toml")).unwrap_err();
    assert!(err.to_string().contains("missing.toml"));
}
