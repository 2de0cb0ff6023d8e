// Machine config loading: encoding vs format failures, sections, save/load

mod common;

use common::*;
use machine_probe::MalformedSnapshotError;
use machine_probe::models::{BlockDevice, NetworkEvent, StorageResult};
use machine_probe::snapshot::ProbeSnapshot;
use std::collections::BTreeMap;
use std::path::Path;

#[test]
fn test_loads_network_section_in_document_order() {
    let snapshot = ProbeSnapshot::load_from_str(EXAMPLE_SNAPSHOT).unwrap();
    let network = snapshot.network().expect("network section");
    assert_eq!(
        network,
        &[
            NetworkEvent::LinkUp {
                device: "eth0".into()
            },
            NetworkEvent::AddrAdded {
                device: "eth0".into(),
                addr: "10.0.0.5".into()
            },
        ]
    );
    assert!(snapshot.storage().is_none());
    assert_eq!(snapshot.section_names(), vec!["network"]);
}

#[test]
fn test_invalid_utf8_is_an_encoding_error() {
    let file = write_snapshot(b"network:\n  - device: \xff\xfe\n");
    let err = ProbeSnapshot::load(file.path()).unwrap_err();
    assert!(
        matches!(err, MalformedSnapshotError::Encoding { .. }),
        "got {err:?}"
    );
    assert!(err.to_string().contains("UTF-8"));
}

#[test]
fn test_bad_yaml_is_a_format_error() {
    let file = write_snapshot(b"network: [unterminated\n");
    let err = ProbeSnapshot::load(file.path()).unwrap_err();
    assert!(matches!(err, MalformedSnapshotError::Format { .. }), "got {err:?}");
}

#[test]
fn test_unknown_event_kind_is_a_format_error() {
    let err = ProbeSnapshot::load_from_str("network:\n  - device: eth0\n    event: exploded\n")
        .unwrap_err();
    assert!(matches!(err, MalformedSnapshotError::Format { .. }));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let err = ProbeSnapshot::load(Path::new("/nonexistent/machine-config.yaml")).unwrap_err();
    assert!(matches!(err, MalformedSnapshotError::Io { .. }));
    assert!(err.to_string().contains("/nonexistent/machine-config.yaml"));
}

#[test]
fn test_empty_document_has_no_sections() {
    let snapshot = ProbeSnapshot::load_from_str("\n").unwrap();
    assert!(snapshot.network().is_none());
    assert!(snapshot.storage().is_none());
    assert!(snapshot.section_names().is_empty());
}

#[test]
fn test_unmodelled_sections_are_kept() {
    let doc = format!("{EXAMPLE_SNAPSHOT}dmi:\n  sys_vendor: QEMU\n");
    let snapshot = ProbeSnapshot::load_from_str(&doc).unwrap();
    let dmi = snapshot.section("dmi").expect("dmi section");
    assert_eq!(dmi["sys_vendor"].as_str(), Some("QEMU"));
    assert_eq!(snapshot.section_names(), vec!["network", "dmi"]);
}

#[test]
fn test_storage_section_parses() {
    let doc = r#"
storage:
  blockdev:
    /dev/vda:
      name: vda
      size: 10737418240
      partitions:
        - name: vda1
          number: 1
          start: 1048576
          size: 536870912
"#;
    let snapshot = ProbeSnapshot::load_from_str(doc).unwrap();
    let storage = snapshot.storage().expect("storage section");
    let vda = &storage.blockdev.as_ref().unwrap()["/dev/vda"];
    assert_eq!(vda.size, 10_737_418_240);
    assert_eq!(vda.partitions.len(), 1);
    assert!(storage.filesystem.is_none());
}

#[test]
fn test_saved_snapshot_loads_back_identical() {
    let mut blockdev = BTreeMap::new();
    blockdev.insert(
        "/dev/sda".to_string(),
        BlockDevice {
            name: "sda".into(),
            size: 512,
            model: "disk".into(),
            vendor: String::new(),
            serial: String::new(),
            removable: true,
            read_only: false,
            partitions: vec![],
        },
    );
    let original = ProbeSnapshot::new(
        Some(vec![NetworkEvent::DeviceAdded {
            device: "eth0".into(),
            mac: Some("52:54:00:12:34:56".into()),
        }]),
        Some(StorageResult {
            blockdev: Some(blockdev),
            filesystem: None,
        }),
    );
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("machine.yaml");
    original.save(&path).unwrap();
    assert_eq!(ProbeSnapshot::load(&path).unwrap(), original);
}
