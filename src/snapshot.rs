// Recorded machine config: a YAML document keyed by subsystem name.

use crate::error::MalformedSnapshotError;
use crate::models::{NetworkEvent, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Immutable probe data loaded from (or captured for) a machine config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProbeSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    network: Option<Vec<NetworkEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    storage: Option<StorageResult>,
    /// Sections this crate does not interpret, kept as recorded.
    #[serde(flatten)]
    extra: BTreeMap<String, serde_yaml::Value>,
}

impl ProbeSnapshot {
    pub fn new(network: Option<Vec<NetworkEvent>>, storage: Option<StorageResult>) -> Self {
        Self {
            network,
            storage,
            extra: BTreeMap::new(),
        }
    }

    /// Read and parse a machine config from disk.
    #[instrument(fields(operation = "load_snapshot"))]
    pub fn load(path: &Path) -> Result<Self, MalformedSnapshotError> {
        let bytes = std::fs::read(path).map_err(|source| MalformedSnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot = Self::from_bytes(&bytes, path)?;
        tracing::debug!(
            sections = ?snapshot.section_names(),
            network_changes = snapshot.network.as_ref().map_or(0, Vec::len),
            "machine config loaded"
        );
        Ok(snapshot)
    }

    /// Parse an in-memory document (e.g. for tests).
    pub fn load_from_str(s: &str) -> Result<Self, MalformedSnapshotError> {
        Self::parse(s, Path::new("<inline>"))
    }

    /// Decode raw bytes; `path` is only used for error detail.
    pub fn from_bytes(bytes: &[u8], path: &Path) -> Result<Self, MalformedSnapshotError> {
        let text = String::from_utf8(bytes.to_vec()).map_err(|source| {
            MalformedSnapshotError::Encoding {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, MalformedSnapshotError> {
        // An empty document is a machine with nothing recorded.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|source| MalformedSnapshotError::Format {
            path: PathBuf::from(path),
            source,
        })
    }

    /// Write the snapshot in the same format `load` reads.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let text = serde_yaml::to_string(self).map_err(std::io::Error::other)?;
        std::fs::write(path, text)
    }

    /// Recorded network changes in document order, if the section exists.
    pub fn network(&self) -> Option<&[NetworkEvent]> {
        self.network.as_deref()
    }

    pub fn storage(&self) -> Option<&StorageResult> {
        self.storage.as_ref()
    }

    /// Raw value of a section this crate does not model.
    pub fn section(&self, name: &str) -> Option<&serde_yaml::Value> {
        self.extra.get(name)
    }

    pub fn section_names(&self) -> Vec<&str> {
        let mut names = Vec::with_capacity(self.extra.len() + 2);
        if self.network.is_some() {
            names.push("network");
        }
        if self.storage.is_some() {
            names.push("storage");
        }
        names.extend(self.extra.keys().map(String::as_str));
        names
    }
}
