// Shared test helpers
#![allow(dead_code)]

use machine_probe::config::ProberConfig;
use machine_probe::error::{EnumerationError, ObserverStartError};
use machine_probe::models::{InterfaceState, NetworkEvent, ProbeTypes, StorageResult};
use machine_probe::network::NetworkSource;
use machine_probe::storage::StorageProber;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const EXAMPLE_SNAPSHOT: &str = r#"
network:
  - device: eth0
    event: link-up
  - device: eth0
    event: addr-added
    addr: 10.0.0.5
"#;

pub fn write_snapshot(contents: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents).unwrap();
    file.flush().unwrap();
    file
}

pub fn replay_config(path: &Path) -> ProberConfig {
    ProberConfig {
        snapshot_path: Some(path.to_path_buf()),
        ..ProberConfig::default()
    }
}

pub fn live_config() -> ProberConfig {
    ProberConfig {
        snapshot_path: None,
        poll_interval: Duration::from_millis(10),
        ..ProberConfig::default()
    }
}

/// Receiver that records every event it is given.
#[derive(Clone, Default)]
pub struct Recorder(pub Arc<Mutex<Vec<NetworkEvent>>>);

impl Recorder {
    pub fn receiver(&self) -> impl FnMut(NetworkEvent) + Send + 'static {
        let events = self.0.clone();
        move |event| events.lock().unwrap().push(event)
    }

    pub fn events(&self) -> Vec<NetworkEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

/// Storage prober that counts invocations and returns a fixed result.
#[derive(Clone)]
pub struct CountingStorage {
    pub calls: Arc<AtomicUsize>,
    pub result: StorageResult,
    pub delay: Duration,
    pub fail_first: usize,
}

impl CountingStorage {
    pub fn new(result: StorageResult) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            result,
            delay: Duration::ZERO,
            fail_first: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StorageProber for CountingStorage {
    fn probe(&self, _probe_types: Option<&ProbeTypes>) -> Result<StorageResult, EnumerationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        if n < self.fail_first {
            return Err(EnumerationError::for_device(
                "blockdev",
                "/dev/sda",
                std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            ));
        }
        Ok(self.result.clone())
    }
}

/// Interface table the test mutates to simulate OS events.
#[derive(Clone, Default)]
pub struct FakeNetwork {
    pub table: Arc<Mutex<Vec<InterfaceState>>>,
    pub unavailable: bool,
}

impl FakeNetwork {
    pub fn set(&self, rows: Vec<InterfaceState>) {
        *self.table.lock().unwrap() = rows;
    }
}

impl NetworkSource for FakeNetwork {
    fn open(&mut self) -> Result<(), ObserverStartError> {
        if self.unavailable {
            return Err(ObserverStartError::SourceUnavailable {
                reason: "netlink socket refused".into(),
            });
        }
        Ok(())
    }

    fn poll(&mut self) -> anyhow::Result<Vec<InterfaceState>> {
        Ok(self.table.lock().unwrap().clone())
    }
}

pub fn iface(name: &str, up: bool, addrs: &[&str]) -> InterfaceState {
    InterfaceState {
        name: name.into(),
        mac: None,
        link_up: up,
        addresses: addrs.iter().map(|a| a.to_string()).collect(),
    }
}

/// Wait until `check` holds, polling the runtime; false on timeout.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Minimal /sys tree: `devices` is (name, sectors, partitions as (number, start, sectors)).
pub fn fake_sysfs(root: &Path, devices: &[(&str, u64, &[(u32, u64, u64)])]) {
    for (name, sectors, parts) in devices {
        let dev = root.join("block").join(name);
        std::fs::create_dir_all(dev.join("device")).unwrap();
        std::fs::write(dev.join("size"), format!("{sectors}\n")).unwrap();
        std::fs::write(dev.join("removable"), "0\n").unwrap();
        std::fs::write(dev.join("ro"), "0\n").unwrap();
        std::fs::write(dev.join("device/model"), "QEMU HARDDISK   \n").unwrap();
        std::fs::write(dev.join("device/vendor"), "ATA\n").unwrap();
        for (number, start, size) in parts.iter() {
            let part = dev.join(format!("{name}{number}"));
            std::fs::create_dir_all(&part).unwrap();
            std::fs::write(part.join("partition"), format!("{number}\n")).unwrap();
            std::fs::write(part.join("start"), format!("{start}\n")).unwrap();
            std::fs::write(part.join("size"), format!("{size}\n")).unwrap();
        }
    }
}
