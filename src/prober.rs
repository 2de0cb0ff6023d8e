//! Single entry point for hardware and network probe data.
//!
//! A [`Prober`] is either live (observing the running system) or replaying a
//! recorded machine config. The mode is decided once, at construction, and
//! callers see identical event shapes and result types in both modes.

use crate::cache::ProbeCache;
use crate::config::ProberConfig;
use crate::error::{EnumerationError, MalformedSnapshotError, ObserverStartError, ProbeError};
use crate::models::{NetworkEvent, ProbeMode, ProbeTrace, ProbeTypes, StorageResult};
use crate::network::{
    LiveNetworkObserver, NetworkReceiver, NetworkSource, ObserverHandle, ReplayNetworkObserver,
    StartOutcome, SysinfoNetworkSource,
};
use crate::snapshot::ProbeSnapshot;
use crate::storage::{StorageProber, SysfsStorageProber};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::instrument;

/// Cache key for storage results.
pub const STORAGE: &str = "storage";

type SourceFactory = Box<dyn Fn() -> Box<dyn NetworkSource> + Send + Sync>;

enum Mode {
    Live { network_source: SourceFactory },
    Replay { snapshot: ProbeSnapshot },
}

pub struct Prober {
    mode: Mode,
    cache: ProbeCache<Arc<StorageResult>>,
    storage: Box<dyn StorageProber>,
    poll_interval: Duration,
    trace: broadcast::Sender<ProbeTrace>,
}

/// Builds a [`Prober`], optionally with substitute OS facilities.
pub struct ProberBuilder {
    config: ProberConfig,
    storage: Option<Box<dyn StorageProber>>,
    network_source: Option<SourceFactory>,
}

impl ProberBuilder {
    /// Storage prober used on a cache miss (default: sysfs under `sys_root`).
    pub fn storage_prober(mut self, prober: impl StorageProber + 'static) -> Self {
        self.storage = Some(Box::new(prober));
        self
    }

    /// Source opened by each live network observation (default: sysinfo).
    pub fn network_source<F, S>(mut self, factory: F) -> Self
    where
        F: Fn() -> S + Send + Sync + 'static,
        S: NetworkSource,
    {
        let factory: SourceFactory =
            Box::new(move || -> Box<dyn NetworkSource> { Box::new(factory()) });
        self.network_source = Some(factory);
        self
    }

    /// Load the snapshot if one is configured. Either returns a complete
    /// prober or fails without constructing one.
    pub fn build(self) -> Result<Prober, MalformedSnapshotError> {
        let ProberBuilder {
            config,
            storage,
            network_source,
        } = self;

        let cache = ProbeCache::new();
        let mode = match &config.snapshot_path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "user specified machine config");
                let snapshot = ProbeSnapshot::load(path).inspect_err(|e| {
                    tracing::error!(error = %e, "failed to parse machine config");
                })?;
                if let Some(storage) = snapshot.storage() {
                    cache.seed(STORAGE, Arc::new(storage.clone()));
                }
                Mode::Replay { snapshot }
            }
            None => {
                let network_source = network_source.unwrap_or_else(|| {
                    let sys_root = config.sys_root.clone();
                    let factory: SourceFactory = Box::new(move || -> Box<dyn NetworkSource> {
                        Box::new(SysinfoNetworkSource::new(sys_root.clone()))
                    });
                    factory
                });
                Mode::Live { network_source }
            }
        };

        let storage = storage.unwrap_or_else(|| -> Box<dyn StorageProber> {
            Box::new(SysfsStorageProber::new(config.sys_root.clone()))
        });
        let (trace, _) = broadcast::channel(config.trace_capacity.max(1));

        let prober = Prober {
            mode,
            cache,
            storage,
            poll_interval: config.poll_interval,
            trace,
        };
        tracing::info!(
            mode = %prober.mode(),
            storage_cached = prober.cache.contains(STORAGE),
            "prober initialised"
        );
        Ok(prober)
    }
}

impl Prober {
    /// Construct with the default OS facilities.
    pub fn new(config: &ProberConfig) -> Result<Self, MalformedSnapshotError> {
        Self::builder(config.clone()).build()
    }

    pub fn builder(config: ProberConfig) -> ProberBuilder {
        ProberBuilder {
            config,
            storage: None,
            network_source: None,
        }
    }

    pub fn mode(&self) -> ProbeMode {
        match self.mode {
            Mode::Live { .. } => ProbeMode::Live,
            Mode::Replay { .. } => ProbeMode::Replay,
        }
    }

    /// The loaded machine config, in replay mode.
    pub fn snapshot(&self) -> Option<&ProbeSnapshot> {
        match &self.mode {
            Mode::Replay { snapshot } => Some(snapshot),
            Mode::Live { .. } => None,
        }
    }

    /// Structured probe activity; each subscriber sees events sent after it subscribed.
    pub fn subscribe_trace(&self) -> broadcast::Receiver<ProbeTrace> {
        self.trace.subscribe()
    }

    fn emit(&self, event: ProbeTrace) {
        // No subscribers is fine.
        let _ = self.trace.send(event);
    }

    /// Start observing the network, delivering events to `receiver`.
    ///
    /// Replay delivers every recorded change, in document order, before
    /// returning. Live mode spawns a background task on the current tokio
    /// runtime and returns at once; the session runs until the handle is stopped.
    #[instrument(skip(self, receiver), fields(operation = "probe_network", mode = %self.mode()))]
    pub fn probe_network<R: NetworkReceiver>(
        &self,
        receiver: R,
    ) -> Result<(ObserverHandle, StartOutcome), ObserverStartError> {
        let started = match &self.mode {
            Mode::Replay { snapshot } => match snapshot.network() {
                Some(changes) => {
                    let (handle, outcome) = ReplayNetworkObserver::new(changes).start(receiver);
                    self.emit(ProbeTrace::ObserverStarted {
                        mode: ProbeMode::Replay,
                    });
                    self.emit(ProbeTrace::ReplayDelivered {
                        events: changes.len(),
                    });
                    tracing::debug!(events = changes.len(), "network replay delivered");
                    Ok((handle, outcome))
                }
                None => Err(ObserverStartError::MissingNetworkSection),
            },
            Mode::Live { network_source } => {
                LiveNetworkObserver::new(network_source(), self.poll_interval, self.trace.clone())
                    .start(Box::new(receiver))
                    .map(|handle| {
                        let outcome = StartOutcome {
                            mode: ProbeMode::Live,
                            delivered: None,
                        };
                        (handle, outcome)
                    })
            }
        };

        if let Err(e) = &started {
            tracing::warn!(error = %e, "network observation failed to start");
            self.emit(ProbeTrace::ObserverStartFailed {
                reason: e.to_string(),
            });
        }
        started
    }

    /// Storage probe data, enumerated at most once per prober.
    ///
    /// On a cache hit `probe_types` is ignored: the first caller's scope wins.
    /// Concurrent callers wait for an in-flight probe rather than starting
    /// another. Failures are not cached. Blocks for the duration of the probe.
    #[instrument(skip(self), fields(operation = "get_storage"))]
    pub fn get_storage(
        &self,
        probe_types: Option<&ProbeTypes>,
    ) -> Result<Arc<StorageResult>, EnumerationError> {
        let lookup = self.cache.get_or_try_insert_with(STORAGE, || {
            tracing::debug!("no storage in probe data, fetching");
            let started = Instant::now();
            match self.storage.probe(probe_types) {
                Ok(result) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    tracing::debug!(elapsed_ms, "storage probed");
                    self.emit(ProbeTrace::StorageProbed { elapsed_ms });
                    Ok(Arc::new(result))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "storage probe failed");
                    self.emit(ProbeTrace::StorageProbeFailed {
                        reason: e.to_string(),
                    });
                    Err(e)
                }
            }
        })?;
        if lookup.is_hit() {
            self.emit(ProbeTrace::StorageCacheHit);
        }
        Ok(lookup.into_value())
    }

    /// [`Prober::get_storage`] on the blocking pool, for async callers.
    pub async fn get_storage_in_background(
        self: &Arc<Self>,
        probe_types: Option<ProbeTypes>,
    ) -> Result<Arc<StorageResult>, ProbeError> {
        let prober = self.clone();
        tokio::task::spawn_blocking(move || prober.get_storage(probe_types.as_ref()))
            .await
            .map_err(|e| ProbeError::Task(e.to_string()))?
            .map_err(ProbeError::from)
    }

    /// Record this machine as a snapshot that replays to the same results.
    ///
    /// Live mode observes the network for `window`, then probes storage.
    /// Replay mode returns the loaded snapshot.
    #[instrument(skip(self), fields(operation = "capture_snapshot", mode = %self.mode()))]
    pub async fn capture_snapshot(
        self: &Arc<Self>,
        window: Duration,
    ) -> Result<ProbeSnapshot, ProbeError> {
        if let Mode::Replay { snapshot } = &self.mode {
            return Ok(snapshot.clone());
        }

        let recorded: Arc<Mutex<Vec<NetworkEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = recorded.clone();
        let (handle, _) = self.probe_network(move |event: NetworkEvent| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        })?;
        tokio::time::sleep(window).await;
        handle.stop();

        let network = std::mem::take(&mut *recorded.lock().unwrap_or_else(PoisonError::into_inner));
        let storage = self.get_storage_in_background(None).await?;
        tracing::info!(network_changes = network.len(), "machine captured");
        Ok(ProbeSnapshot::new(Some(network), Some((*storage).clone())))
    }
}

/// Convenience for callers that only have a snapshot path.
pub fn new_prober(snapshot_path: Option<PathBuf>) -> Result<Prober, MalformedSnapshotError> {
    Prober::new(&ProberConfig {
        snapshot_path,
        ..ProberConfig::default()
    })
}
