// Per-session probe results keyed by subsystem name ("storage", ...).
// An entry is computed at most once; callers that arrive while it is being
// computed wait for that result instead of starting a second probe.

use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

enum Slot<V> {
    InFlight,
    Ready(V),
}

/// Result of a cache lookup that may have run the probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<V> {
    /// Served from an entry that already existed (or was finished by another caller).
    Hit(V),
    /// This caller ran the probe.
    Computed(V),
}

impl<V> Lookup<V> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    pub fn into_value(self) -> V {
        match self {
            Lookup::Hit(v) | Lookup::Computed(v) => v,
        }
    }
}

pub struct ProbeCache<V> {
    slots: Mutex<HashMap<String, Slot<V>>>,
    settled: Condvar,
}

impl<V: Clone> Default for ProbeCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> ProbeCache<V> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            settled: Condvar::new(),
        }
    }

    // Slots are only ever replaced whole, so a poisoned map is still consistent.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot<V>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a value up front (snapshot pre-population). Replaces any ready entry.
    pub fn seed(&self, key: &str, value: V) {
        self.lock().insert(key.to_string(), Slot::Ready(value));
        self.settled.notify_all();
    }

    /// Ready value for `key`, without waiting on an in-flight probe.
    pub fn get(&self, key: &str) -> Option<V> {
        match self.lock().get(key) {
            Some(Slot::Ready(v)) => Some(v.clone()),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        matches!(self.lock().get(key), Some(Slot::Ready(_)))
    }

    /// Return the cached value for `key`, or run `compute` once to fill it.
    ///
    /// Errors are returned to the caller that ran `compute` and nothing is
    /// stored, so the next request probes again. Callers blocked on that
    /// in-flight probe wake up and one of them takes over the probe.
    pub fn get_or_try_insert_with<E, F>(&self, key: &str, compute: F) -> Result<Lookup<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let mut slots = self.lock();
        loop {
            match slots.get(key) {
                Some(Slot::Ready(v)) => return Ok(Lookup::Hit(v.clone())),
                Some(Slot::InFlight) => {
                    slots = self
                        .settled
                        .wait(slots)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                None => break,
            }
        }
        slots.insert(key.to_string(), Slot::InFlight);
        drop(slots);

        let mut claim = InFlightClaim {
            cache: self,
            key,
            settled: false,
        };
        let result = compute();

        let mut slots = self.lock();
        match &result {
            Ok(v) => {
                slots.insert(key.to_string(), Slot::Ready(v.clone()));
            }
            Err(_) => {
                slots.remove(key);
            }
        }
        claim.settled = true;
        drop(slots);
        self.settled.notify_all();

        result.map(Lookup::Computed)
    }
}

/// Clears the in-flight marker if `compute` unwinds, so waiters are not stuck.
struct InFlightClaim<'a, V: Clone> {
    cache: &'a ProbeCache<V>,
    key: &'a str,
    settled: bool,
}

impl<V: Clone> Drop for InFlightClaim<'_, V> {
    fn drop(&mut self) {
        if !self.settled {
            self.cache.lock().remove(self.key);
            self.cache.settled.notify_all();
        }
    }
}
