//! Adapter Loader
//!
//! Resolves manifests into adapter instances, once per (capability,
//! provider). Concurrent first requests for the same key share a single
//! load; different keys load in parallel.
//!
//! Each key is either absent (never loaded, or last load failed), loading
//! (a ticketed in-flight load that waiters subscribe to), or ready.
//! Failures are never cached.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::module::AdapterHandle;
use super::strategy::ResolutionStrategy;
use crate::common::{RegistryError, RegistryResult};
use crate::manifest::{AdapterKey, Manifest};

type Outcome = Option<RegistryResult<AdapterHandle>>;

enum Slot {
    Loading {
        ticket: u64,
        outcome: watch::Receiver<Outcome>,
    },
    Ready(AdapterHandle),
}

type Slots = Arc<Mutex<HashMap<AdapterKey, Slot>>>;

fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<AdapterKey, Slot>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct AdapterLoader {
    strategy: ResolutionStrategy,
    slots: Slots,
    next_ticket: AtomicU64,
}

impl AdapterLoader {
    pub fn new(strategy: ResolutionStrategy) -> Self {
        Self {
            strategy,
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_ticket: AtomicU64::new(0),
        }
    }

    pub fn strategy(&self) -> &ResolutionStrategy {
        &self.strategy
    }

    /// Resolve a manifest to its adapter, loading it on first use.
    ///
    /// The load itself runs on a spawned task: dropping this future stops
    /// waiting but does not cancel the load, which still fills the cache.
    pub async fn resolve(&self, manifest: &Arc<Manifest>) -> RegistryResult<AdapterHandle> {
        let key = manifest.key();

        let (ticket, mut outcome) = {
            let mut slots = lock(&self.slots);
            match slots.get(&key) {
                Some(Slot::Ready(handle)) => {
                    debug!("Adapter cache hit: {}", key);
                    return Ok(Arc::clone(handle));
                }
                Some(Slot::Loading { ticket, outcome }) => {
                    debug!("Joining in-flight load: {}", key);
                    (*ticket, outcome.clone())
                }
                None => {
                    let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
                    let (tx, rx) = watch::channel(None);
                    slots.insert(
                        key.clone(),
                        Slot::Loading {
                            ticket,
                            outcome: rx.clone(),
                        },
                    );
                    self.spawn_load(key.clone(), ticket, Arc::clone(manifest), tx);
                    (ticket, rx)
                }
            }
        };

        let result = match outcome.wait_for(Option::is_some).await {
            Ok(done) => done.clone(),
            Err(_) => None,
        };

        result.unwrap_or_else(|| {
            // Load task went away without reporting (panicked factory)
            self.release(&key, ticket);
            Err(RegistryError::resolution(
                &key.capability,
                &key.provider,
                "load task ended without a result",
            ))
        })
    }

    fn spawn_load(
        &self,
        key: AdapterKey,
        ticket: u64,
        manifest: Arc<Manifest>,
        tx: watch::Sender<Outcome>,
    ) {
        let slots = Arc::clone(&self.slots);
        let strategy = self.strategy.clone();

        tokio::spawn(async move {
            let result = instantiate(&strategy, &manifest).await;

            {
                let mut slots = lock(&slots);
                let current = matches!(
                    slots.get(&key),
                    Some(Slot::Loading { ticket: t, .. }) if *t == ticket
                );
                if !current {
                    debug!("Discarding load for evicted adapter {}", key);
                } else if let Ok(handle) = &result {
                    slots.insert(key.clone(), Slot::Ready(Arc::clone(handle)));
                } else {
                    slots.remove(&key);
                }
            }

            match &result {
                Ok(_) => info!("Loaded adapter {}", key),
                Err(e) => warn!("{}", e),
            }

            let _ = tx.send(Some(result));
        });
    }

    /// Drop an in-flight slot if it is still the one identified by `ticket`
    fn release(&self, key: &AdapterKey, ticket: u64) {
        let mut slots = lock(&self.slots);
        if matches!(slots.get(key), Some(Slot::Loading { ticket: t, .. }) if *t == ticket) {
            slots.remove(key);
        }
    }

    /// Whether a resolved instance is cached for `key`
    pub fn is_cached(&self, key: &AdapterKey) -> bool {
        matches!(lock(&self.slots).get(key), Some(Slot::Ready(_)))
    }

    /// Keys with a resolved instance, sorted
    pub fn cached_keys(&self) -> Vec<AdapterKey> {
        let mut keys: Vec<AdapterKey> = lock(&self.slots)
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Forget `key`. An in-flight load for it still completes for its
    /// waiters but is not cached.
    pub fn evict(&self, key: &AdapterKey) -> bool {
        lock(&self.slots).remove(key).is_some()
    }

    /// Keep only entries whose key satisfies `keep`; returns evicted keys, sorted.
    pub fn retain(&self, mut keep: impl FnMut(&AdapterKey) -> bool) -> Vec<AdapterKey> {
        let mut evicted = Vec::new();
        lock(&self.slots).retain(|key, _| {
            let retained = keep(key);
            if !retained {
                evicted.push(key.clone());
            }
            retained
        });
        evicted.sort();
        evicted
    }

    pub fn clear(&self) {
        lock(&self.slots).clear();
    }
}

impl Default for AdapterLoader {
    fn default() -> Self {
        Self::new(ResolutionStrategy::default())
    }
}

/// Run the manifest's loader and build the adapter from the selected export
async fn instantiate(
    strategy: &ResolutionStrategy,
    manifest: &Manifest,
) -> RegistryResult<AdapterHandle> {
    let (capability, provider) = (&manifest.capability, &manifest.provider);

    let module = manifest.loader.load().await.map_err(|e| {
        RegistryError::resolution(capability, provider, format!("loader failed: {}", e))
    })?;

    let (lookup, factory) = strategy.select(&module, provider).ok_or_else(|| {
        RegistryError::resolution(
            capability,
            provider,
            format!(
                "no usable adapter export (tried {})",
                strategy.describe(provider)
            ),
        )
    })?;

    debug!("Resolved {}/{} via {} export", capability, provider, lookup);

    factory(manifest).map_err(|e| {
        RegistryError::resolution(
            capability,
            provider,
            format!("{} export failed to construct adapter: {}", lookup, e),
        )
    })
}
