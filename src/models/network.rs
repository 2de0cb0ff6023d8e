// Network change events and interface table rows

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One incremental network change. Serialized as a record tagged by `event`,
/// e.g. `{device: eth0, event: addr-added, addr: 10.0.0.5}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum NetworkEvent {
    DeviceAdded {
        device: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mac: Option<String>,
    },
    DeviceRemoved {
        device: String,
    },
    LinkUp {
        device: String,
    },
    LinkDown {
        device: String,
    },
    AddrAdded {
        device: String,
        addr: String,
    },
    AddrRemoved {
        device: String,
        addr: String,
    },
}

impl NetworkEvent {
    /// Name of the interface this change applies to.
    pub fn device(&self) -> &str {
        match self {
            NetworkEvent::DeviceAdded { device, .. }
            | NetworkEvent::DeviceRemoved { device }
            | NetworkEvent::LinkUp { device }
            | NetworkEvent::LinkDown { device }
            | NetworkEvent::AddrAdded { device, .. }
            | NetworkEvent::AddrRemoved { device, .. } => device,
        }
    }

    /// Wire name of the change kind (`link-up`, `addr-added`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            NetworkEvent::DeviceAdded { .. } => "device-added",
            NetworkEvent::DeviceRemoved { .. } => "device-removed",
            NetworkEvent::LinkUp { .. } => "link-up",
            NetworkEvent::LinkDown { .. } => "link-down",
            NetworkEvent::AddrAdded { .. } => "addr-added",
            NetworkEvent::AddrRemoved { .. } => "addr-removed",
        }
    }
}

impl fmt::Display for NetworkEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkEvent::AddrAdded { device, addr } | NetworkEvent::AddrRemoved { device, addr } => {
                write!(f, "{}({}, {})", self.kind(), device, addr)
            }
            _ => write!(f, "{}({})", self.kind(), self.device()),
        }
    }
}

/// Point-in-time view of one interface as reported by a live source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterfaceState {
    pub name: String,
    pub mac: Option<String>,
    pub link_up: bool,
    /// Addresses in `addr/prefix` form.
    pub addresses: BTreeSet<String>,
}
