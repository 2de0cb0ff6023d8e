// Structured probe activity events, published on the prober's trace channel

use serde::Serialize;
use std::fmt;

/// Where probe data comes from for the lifetime of a prober.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    Live,
    Replay,
}

impl fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeMode::Live => f.write_str("live"),
            ProbeMode::Replay => f.write_str("replay"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProbeTrace {
    ObserverStarted { mode: ProbeMode },
    ObserverStartFailed { reason: String },
    ReplayDelivered { events: usize },
    ObserverStopped,
    StorageCacheHit,
    StorageProbed { elapsed_ms: u64 },
    StorageProbeFailed { reason: String },
}
