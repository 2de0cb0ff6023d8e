// Live network observer: polls an OS interface source on a background task and
// pushes the differences to the receiver as `NetworkEvent`s.

use super::{NetworkReceiver, ObserverHandle, diff_interfaces, interface_table};
use crate::error::ObserverStartError;
use crate::models::{InterfaceState, NetworkEvent, ProbeMode, ProbeTrace};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{broadcast, oneshot};
use tokio::time::{Duration, interval};

/// OS facility reporting the current interface table.
pub trait NetworkSource: Send + 'static {
    /// Open the underlying notification channel. Called once, before any poll.
    fn open(&mut self) -> Result<(), ObserverStartError>;

    /// Current interfaces. May block briefly; runs on the blocking pool.
    fn poll(&mut self) -> anyhow::Result<Vec<InterfaceState>>;
}

type ReceiverSlot = Arc<Mutex<Option<Box<dyn NetworkReceiver>>>>;

pub struct LiveNetworkObserver {
    source: Box<dyn NetworkSource>,
    poll_interval: Duration,
    trace: broadcast::Sender<ProbeTrace>,
}

impl LiveNetworkObserver {
    pub fn new(
        source: Box<dyn NetworkSource>,
        poll_interval: Duration,
        trace: broadcast::Sender<ProbeTrace>,
    ) -> Self {
        Self {
            source,
            poll_interval,
            trace,
        }
    }

    /// Open the source and spawn the delivery task on the current tokio runtime.
    /// Returns immediately; events arrive on the task.
    pub fn start(
        self,
        receiver: Box<dyn NetworkReceiver>,
    ) -> Result<ObserverHandle, ObserverStartError> {
        let Self {
            mut source,
            poll_interval,
            trace,
        } = self;

        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ObserverStartError::NoRuntime)?;
        source.open()?;

        let slot: ReceiverSlot = Arc::new(Mutex::new(Some(receiver)));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        runtime.spawn(run(source, poll_interval, slot.clone(), shutdown_rx));

        tracing::info!(
            operation = "probe_network",
            mode = %ProbeMode::Live,
            poll_interval_ms = poll_interval.as_millis() as u64,
            "live network observer started"
        );
        let _ = trace.send(ProbeTrace::ObserverStarted {
            mode: ProbeMode::Live,
        });

        Ok(ObserverHandle::live(LiveSession {
            slot,
            shutdown: Mutex::new(Some(shutdown_tx)),
            trace,
        }))
    }
}

pub(crate) struct LiveSession {
    slot: ReceiverSlot,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
    trace: broadcast::Sender<ProbeTrace>,
}

impl LiveSession {
    pub(crate) fn is_active(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn stop(&self) {
        // Delivery holds this lock per event, so once the receiver is taken
        // no event can reach it.
        let receiver = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            let _ = tx.send(());
        }
        if receiver.is_some() {
            tracing::info!(operation = "stop_network", "live network observer stopped");
            let _ = self.trace.send(ProbeTrace::ObserverStopped);
        }
    }
}

async fn run(
    source: Box<dyn NetworkSource>,
    poll_interval: Duration,
    slot: ReceiverSlot,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    let source = Arc::new(Mutex::new(source));
    let mut tick = interval(poll_interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut known: BTreeMap<String, InterfaceState> = BTreeMap::new();
    // A dropped handle closes the channel without asking us to stop.
    let mut attached = true;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let source = source.clone();
                let polled = tokio::task::spawn_blocking(move || {
                    source.lock().unwrap_or_else(PoisonError::into_inner).poll()
                })
                .await;
                let table = match polled {
                    Ok(Ok(rows)) => interface_table(rows),
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, operation = "poll_network", "network poll failed");
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, operation = "poll_network", "network poll task failed");
                        break;
                    }
                };
                let events = diff_interfaces(&known, &table);
                known = table;
                if !deliver(&slot, events) {
                    break;
                }
            }
            res = &mut shutdown_rx, if attached => {
                if res.is_ok() {
                    break;
                }
                attached = false;
            }
        }
    }
    tracing::debug!("live network observer task exiting");
}

/// Push events in order; false once the session has been stopped.
fn deliver(slot: &Mutex<Option<Box<dyn NetworkReceiver>>>, events: Vec<NetworkEvent>) -> bool {
    for event in events {
        let mut receiver = slot.lock().unwrap_or_else(PoisonError::into_inner);
        match receiver.as_mut() {
            Some(r) => {
                tracing::trace!(%event, "network event");
                r.on_event(event);
            }
            None => return false,
        }
    }
    slot.lock().unwrap_or_else(PoisonError::into_inner).is_some()
}
