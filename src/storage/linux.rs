// Linux-specific helpers: block devices and partitions from /sys/block.

use crate::error::EnumerationError;
use crate::models::{BlockDevice, Partition};
use std::path::Path;

const SECTOR_SIZE: u64 = 512;

fn read_attr(path: &Path) -> Option<String> {
    let v = std::fs::read_to_string(path).ok()?;
    let v = v.trim();
    if v.is_empty() {
        return None;
    }
    Some(v.to_string())
}

fn read_flag(path: &Path) -> bool {
    read_attr(path).as_deref() == Some("1")
}

fn read_sectors(path: &Path) -> std::io::Result<u64> {
    let raw = std::fs::read_to_string(path)?;
    raw.trim()
        .parse::<u64>()
        .map(|sectors| sectors * SECTOR_SIZE)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Kernel names of all block devices, sorted.
pub(super) fn list_block_devices(sys_root: &Path) -> Result<Vec<String>, EnumerationError> {
    let dir = sys_root.join("block");
    let entries = std::fs::read_dir(&dir).map_err(|e| EnumerationError::new("blockdev", e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| EnumerationError::new("blockdev", e))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

pub(super) fn read_block_device(
    sys_root: &Path,
    name: &str,
    with_partitions: bool,
) -> Result<BlockDevice, EnumerationError> {
    let dev_dir = sys_root.join("block").join(name);
    let device_path = format!("/dev/{name}");
    let size = read_sectors(&dev_dir.join("size"))
        .map_err(|e| EnumerationError::for_device("blockdev", &device_path, e))?;

    let partitions = if with_partitions {
        read_partitions(&dev_dir)
            .map_err(|e| EnumerationError::for_device("partition", &device_path, e))?
    } else {
        Vec::new()
    };

    Ok(BlockDevice {
        name: name.to_string(),
        size,
        model: read_attr(&dev_dir.join("device/model")).unwrap_or_default(),
        vendor: read_attr(&dev_dir.join("device/vendor")).unwrap_or_default(),
        serial: read_attr(&dev_dir.join("device/serial"))
            .or_else(|| read_attr(&dev_dir.join("serial")))
            .unwrap_or_default(),
        removable: read_flag(&dev_dir.join("removable")),
        read_only: read_flag(&dev_dir.join("ro")),
        partitions,
    })
}

/// Partitions are the child directories that carry a `partition` number file.
fn read_partitions(dev_dir: &Path) -> std::io::Result<Vec<Partition>> {
    let mut partitions = Vec::new();
    for entry in std::fs::read_dir(dev_dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(number) = read_attr(&path.join("partition")).and_then(|n| n.parse().ok()) else {
            continue;
        };
        partitions.push(Partition {
            name: entry.file_name().to_string_lossy().into_owned(),
            number,
            start: read_sectors(&path.join("start"))?,
            size: read_sectors(&path.join("size"))?,
        });
    }
    partitions.sort_by_key(|p| p.number);
    Ok(partitions)
}
