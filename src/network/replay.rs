// Replay network observer: delivers a snapshot's recorded changes synchronously.

use super::{NetworkReceiver, ObserverHandle, StartOutcome};
use crate::models::{NetworkEvent, ProbeMode};

/// Regenerates live-observer events from a recorded network section.
///
/// `start` drains every recorded change to the receiver, in document order,
/// before it returns. Callers must not assume events arrive after `start`.
pub struct ReplayNetworkObserver<'a> {
    changes: &'a [NetworkEvent],
}

impl<'a> ReplayNetworkObserver<'a> {
    pub fn new(changes: &'a [NetworkEvent]) -> Self {
        Self { changes }
    }

    pub fn start<R: NetworkReceiver>(self, mut receiver: R) -> (ObserverHandle, StartOutcome) {
        for event in self.changes {
            tracing::trace!(%event, "replayed network event");
            receiver.on_event(event.clone());
        }
        let outcome = StartOutcome {
            mode: ProbeMode::Replay,
            delivered: Some(self.changes.len()),
        };
        (ObserverHandle::finished(), outcome)
    }
}
