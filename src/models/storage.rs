// Storage / block device models

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Storage subsystem that can be enumerated independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeType {
    Blockdev,
    Partition,
    Filesystem,
}

pub type ProbeTypes = BTreeSet<ProbeType>;

impl ProbeType {
    pub const ALL: [ProbeType; 3] = [ProbeType::Blockdev, ProbeType::Partition, ProbeType::Filesystem];

    pub fn as_str(self) -> &'static str {
        match self {
            ProbeType::Blockdev => "blockdev",
            ProbeType::Partition => "partition",
            ProbeType::Filesystem => "filesystem",
        }
    }
}

impl fmt::Display for ProbeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown storage probe type {0:?} (expected one of blockdev, partition, filesystem)")]
pub struct UnknownProbeType(pub String);

impl FromStr for ProbeType {
    type Err = UnknownProbeType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "blockdev" => Ok(ProbeType::Blockdev),
            "partition" => Ok(ProbeType::Partition),
            "filesystem" => Ok(ProbeType::Filesystem),
            _ => Err(UnknownProbeType(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub name: String,
    pub number: u32,
    /// Offset from the start of the parent device, in bytes.
    pub start: u64,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDevice {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub removable: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub partitions: Vec<Partition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filesystem {
    pub device: String,
    pub mount_point: String,
    pub fs_type: String,
    pub total_space: u64,
    pub available_space: u64,
}

/// Everything the storage prober found in one pass. A section is `None` when
/// its probe type was not requested.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageResult {
    /// Keyed by device path (`/dev/sda`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockdev: Option<BTreeMap<String, BlockDevice>>,
    /// Keyed by mount point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<BTreeMap<String, Filesystem>>,
}
