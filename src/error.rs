//! Error types for probing.
//!
//! Every error propagates to the immediate caller. Nothing here is retried
//! internally and the prober never falls back from one mode to the other.

use std::path::PathBuf;
use thiserror::Error;

/// The recorded machine config could not be turned into a snapshot.
#[derive(Debug, Error)]
pub enum MalformedSnapshotError {
    #[error("failed to read machine config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not UTF-8 text (corrupt file or wrong encoding).
    #[error("machine config {} is not valid UTF-8 text: {source}", .path.display())]
    Encoding {
        path: PathBuf,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// The text is not a YAML document of the expected shape.
    #[error("failed to parse machine config {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A network observation session could not be started.
#[derive(Debug, Error)]
pub enum ObserverStartError {
    #[error("live network observation requires a running tokio runtime")]
    NoRuntime,

    #[error("network notification source unavailable: {reason}")]
    SourceUnavailable { reason: String },

    #[error("machine config has no network section to replay")]
    MissingNetworkSection,
}

/// Storage enumeration failed, naming the subsystem and device where known.
#[derive(Debug, Error)]
#[error(
    "{subsystem} enumeration failed{}: {source}",
    .device.as_ref().map(|d| format!(" for {d}")).unwrap_or_default()
)]
pub struct EnumerationError {
    pub subsystem: String,
    pub device: Option<String>,
    #[source]
    pub source: std::io::Error,
}

impl EnumerationError {
    pub fn new(subsystem: impl Into<String>, source: std::io::Error) -> Self {
        Self {
            subsystem: subsystem.into(),
            device: None,
            source,
        }
    }

    pub fn for_device(
        subsystem: impl Into<String>,
        device: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self {
            subsystem: subsystem.into(),
            device: Some(device.into()),
            source,
        }
    }
}

/// Umbrella error for entry points that can fail in more than one way.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Snapshot(#[from] MalformedSnapshotError),

    #[error(transparent)]
    ObserverStart(#[from] ObserverStartError),

    #[error(transparent)]
    Enumeration(#[from] EnumerationError),

    #[error("background probe task failed: {0}")]
    Task(String),
}
