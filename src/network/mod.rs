// Network observation: receivers, observer handles and interface-table diffing.
// Live and replay observers both feed receivers the same `NetworkEvent` vocabulary.

mod linux;
pub mod live;
pub mod replay;
pub mod sysinfo_source;

use crate::models::{InterfaceState, NetworkEvent, ProbeMode};
use std::collections::BTreeMap;

pub use live::{LiveNetworkObserver, NetworkSource};
pub use replay::ReplayNetworkObserver;
pub use sysinfo_source::SysinfoNetworkSource;

/// Accepts network events one at a time. Live sessions call it from a
/// background task; replay calls it on the thread that started probing.
pub trait NetworkReceiver: Send + 'static {
    fn on_event(&mut self, event: NetworkEvent);
}

impl<F> NetworkReceiver for F
where
    F: FnMut(NetworkEvent) + Send + 'static,
{
    fn on_event(&mut self, event: NetworkEvent) {
        self(event)
    }
}

/// How an observation session started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOutcome {
    pub mode: ProbeMode,
    /// Replay delivers everything before returning; live sessions have not delivered yet.
    pub delivered: Option<usize>,
}

/// Caller-owned handle to an observation session.
///
/// Dropping the handle detaches a live session (it keeps delivering until the
/// process exits); call [`ObserverHandle::stop`] to end it.
pub struct ObserverHandle {
    inner: HandleInner,
}

enum HandleInner {
    Live(live::LiveSession),
    Finished,
}

impl std::fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverHandle")
            .field("mode", &self.mode())
            .field("active", &self.is_active())
            .finish()
    }
}

impl ObserverHandle {
    pub(crate) fn live(session: live::LiveSession) -> Self {
        Self {
            inner: HandleInner::Live(session),
        }
    }

    pub(crate) fn finished() -> Self {
        Self {
            inner: HandleInner::Finished,
        }
    }

    pub fn mode(&self) -> ProbeMode {
        match self.inner {
            HandleInner::Live(_) => ProbeMode::Live,
            HandleInner::Finished => ProbeMode::Replay,
        }
    }

    /// Whether events may still reach the receiver.
    pub fn is_active(&self) -> bool {
        match &self.inner {
            HandleInner::Live(session) => session.is_active(),
            HandleInner::Finished => false,
        }
    }

    /// End the session. Once this returns the receiver gets no further events.
    /// Idempotent; a no-op for replay sessions. Must not be called from inside
    /// the receiver.
    pub fn stop(&self) {
        if let HandleInner::Live(session) = &self.inner {
            session.stop();
        }
    }
}

/// Index interfaces by name.
pub(crate) fn interface_table(rows: Vec<InterfaceState>) -> BTreeMap<String, InterfaceState> {
    rows.into_iter().map(|row| (row.name.clone(), row)).collect()
}

/// Events that turn `prev` into `next`, grouped per device in name order.
pub(crate) fn diff_interfaces(
    prev: &BTreeMap<String, InterfaceState>,
    next: &BTreeMap<String, InterfaceState>,
) -> Vec<NetworkEvent> {
    let mut events = Vec::new();

    for (name, now) in next {
        let before = prev.get(name);
        if before.is_none() {
            events.push(NetworkEvent::DeviceAdded {
                device: name.clone(),
                mac: now.mac.clone(),
            });
        }

        let was_up = before.is_some_and(|b| b.link_up);
        match (was_up, now.link_up) {
            (false, true) => events.push(NetworkEvent::LinkUp {
                device: name.clone(),
            }),
            (true, false) => events.push(NetworkEvent::LinkDown {
                device: name.clone(),
            }),
            _ => {}
        }

        for addr in &now.addresses {
            if !before.is_some_and(|b| b.addresses.contains(addr)) {
                events.push(NetworkEvent::AddrAdded {
                    device: name.clone(),
                    addr: addr.clone(),
                });
            }
        }
        if let Some(before) = before {
            for addr in before.addresses.difference(&now.addresses) {
                events.push(NetworkEvent::AddrRemoved {
                    device: name.clone(),
                    addr: addr.clone(),
                });
            }
        }
    }

    for name in prev.keys().filter(|n| !next.contains_key(*n)) {
        events.push(NetworkEvent::DeviceRemoved {
            device: name.clone(),
        });
    }

    events
}
