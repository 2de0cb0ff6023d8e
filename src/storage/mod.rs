// Storage enumeration: block devices and partitions from sysfs, mounted
// filesystems via sysinfo. One synchronous pass per call.

mod linux;

use crate::error::EnumerationError;
use crate::models::{BlockDevice, Filesystem, ProbeType, ProbeTypes, StorageResult};
use std::collections::BTreeMap;
use std::path::PathBuf;
use sysinfo::Disks;
use tracing::instrument;

/// Leaf storage enumerator. Blocks for the duration of the probe.
pub trait StorageProber: Send + Sync {
    /// Enumerate the requested subsystems (`None` means all of them).
    fn probe(&self, probe_types: Option<&ProbeTypes>) -> Result<StorageResult, EnumerationError>;
}

pub struct SysfsStorageProber {
    sys_root: PathBuf,
}

impl Default for SysfsStorageProber {
    fn default() -> Self {
        Self::new("/sys")
    }
}

impl SysfsStorageProber {
    pub fn new(sys_root: impl Into<PathBuf>) -> Self {
        Self {
            sys_root: sys_root.into(),
        }
    }

    fn probe_blockdevs(
        &self,
        with_partitions: bool,
    ) -> Result<BTreeMap<String, BlockDevice>, EnumerationError> {
        linux::list_block_devices(&self.sys_root)?
            .into_iter()
            .map(|name| -> Result<_, EnumerationError> {
                let dev = linux::read_block_device(&self.sys_root, &name, with_partitions)?;
                Ok((format!("/dev/{name}"), dev))
            })
            .collect()
    }

    fn probe_filesystems(&self) -> BTreeMap<String, Filesystem> {
        let disks = Disks::new_with_refreshed_list();
        disks
            .list()
            .iter()
            .map(|d| {
                let fs = Filesystem {
                    device: d.name().to_string_lossy().into_owned(),
                    mount_point: d.mount_point().to_string_lossy().into_owned(),
                    fs_type: d.file_system().to_string_lossy().into_owned(),
                    total_space: d.total_space(),
                    available_space: d.available_space(),
                };
                (fs.mount_point.clone(), fs)
            })
            .collect()
    }
}

impl StorageProber for SysfsStorageProber {
    #[instrument(skip(self), fields(operation = "probe_storage", sys_root = %self.sys_root.display()))]
    fn probe(&self, probe_types: Option<&ProbeTypes>) -> Result<StorageResult, EnumerationError> {
        let wants = |t: ProbeType| probe_types.is_none_or(|types| types.contains(&t));
        let with_partitions = wants(ProbeType::Partition);

        let blockdev = if wants(ProbeType::Blockdev) || with_partitions {
            Some(self.probe_blockdevs(with_partitions)?)
        } else {
            None
        };
        let filesystem = wants(ProbeType::Filesystem).then(|| self.probe_filesystems());

        tracing::debug!(
            blockdevs = blockdev.as_ref().map_or(0, BTreeMap::len),
            filesystems = filesystem.as_ref().map_or(0, BTreeMap::len),
            "storage probe complete"
        );
        Ok(StorageResult {
            blockdev,
            filesystem,
        })
    }
}
