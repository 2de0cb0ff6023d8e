use crate::models::ProbeTypes;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "machine-probe.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub prober: ProberSection,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProberSection {
    /// Recorded machine config to replay instead of probing live hardware.
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_sys_root")]
    pub sys_root: PathBuf,
    /// Subsystems the CLI probes when none are given (empty means all).
    #[serde(default)]
    pub probe_types: ProbeTypes,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sys_root: default_sys_root(),
            probe_types: ProbeTypes::new(),
        }
    }
}

fn default_sys_root() -> PathBuf {
    PathBuf::from("/sys")
}

#[derive(Debug, Clone, Deserialize)]
pub struct TraceConfig {
    /// Buffered probe trace events per subscriber (slow subscribers lag).
    #[serde(default = "default_trace_capacity")]
    pub capacity: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            capacity: default_trace_capacity(),
        }
    }
}

fn default_trace_capacity() -> usize {
    64
}

/// What the prober needs at construction; mode is fixed by `snapshot_path`.
#[derive(Debug, Clone)]
pub struct ProberConfig {
    pub snapshot_path: Option<PathBuf>,
    pub poll_interval: Duration,
    pub sys_root: PathBuf,
    pub trace_capacity: usize,
}

impl Default for ProberConfig {
    fn default() -> Self {
        AppConfig::default().prober_config()
    }
}

impl AppConfig {
    /// Load from `CONFIG_FILE`, else `machine-probe.toml` if present, else defaults.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("CONFIG_FILE") {
            Ok(path) => Self::load_from_path(Path::new(&path)),
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::load_from_path(Path::new(DEFAULT_CONFIG_FILE))
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("config {}: {}", path.display(), e))?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if let Some(path) = &self.prober.snapshot_path {
            anyhow::ensure!(
                !path.as_os_str().is_empty(),
                "prober.snapshot_path must be non-empty when set"
            );
        }
        anyhow::ensure!(
            self.network.poll_interval_ms > 0,
            "network.poll_interval_ms must be > 0, got {}",
            self.network.poll_interval_ms
        );
        anyhow::ensure!(
            !self.storage.sys_root.as_os_str().is_empty(),
            "storage.sys_root must be non-empty"
        );
        anyhow::ensure!(
            self.trace.capacity > 0,
            "trace.capacity must be > 0, got {}",
            self.trace.capacity
        );
        Ok(())
    }

    pub fn prober_config(&self) -> ProberConfig {
        ProberConfig {
            snapshot_path: self.prober.snapshot_path.clone(),
            poll_interval: Duration::from_millis(self.network.poll_interval_ms),
            sys_root: self.storage.sys_root.clone(),
            trace_capacity: self.trace.capacity,
        }
    }
}
