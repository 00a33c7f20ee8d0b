//! Adapter Registry
//!
//! Facade over scanner, index and loader. Discovery swaps in a fully built
//! index; readers always see either the previous index or the new one.

pub mod watcher;

use serde::Serialize;
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::adapter::{AdapterHandle, AdapterLoader, ModuleCatalog};
use crate::common::{RegistryError, RegistryResult};
use crate::config::RegistryConfig;
use crate::manifest::{AdapterKey, CapabilityIndex, Manifest, ManifestScanner, ScanProblem};

pub use watcher::WatcherHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryState {
    Uninitialized,
    Ready,
}

/// Outcome of a successful discovery
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub capabilities: Vec<String>,
    pub adapters: usize,
    pub problems: Vec<ScanProblem>,
    /// Cached adapters dropped because their manifest disappeared
    pub evicted: Vec<AdapterKey>,
}

/// Index plus the problems reported alongside it, swapped as one unit
struct Discovered {
    index: Arc<CapabilityIndex>,
    problems: Vec<ScanProblem>,
}

pub struct AdapterRegistry {
    config: RegistryConfig,
    scanner: ManifestScanner,
    loader: AdapterLoader,
    active: RwLock<Option<Arc<Discovered>>>,
    /// Serializes discovery; readers never take it
    discovery: Mutex<()>,
}

impl AdapterRegistry {
    pub fn new(config: RegistryConfig, catalog: ModuleCatalog) -> Self {
        let scanner = ManifestScanner::new(&config.scan_root, Arc::new(catalog))
            .with_max_manifest_bytes(config.max_manifest_bytes);
        let loader = AdapterLoader::new(config.resolution.clone());

        Self {
            config,
            scanner,
            loader,
            active: RwLock::new(None),
            discovery: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Scan, index and swap in the result.
    ///
    /// Concurrent calls run one after another. On failure (inaccessible
    /// root, duplicate provider) the previous index stays active. Cached
    /// adapters whose manifest is gone are evicted; the rest are kept.
    pub async fn discover(&self) -> RegistryResult<DiscoveryReport> {
        let _serialized = self.discovery.lock().await;

        let report = self.scanner.scan().await?;
        let index = Arc::new(CapabilityIndex::build(report.manifests)?);

        let discovered = Arc::new(Discovered {
            index: Arc::clone(&index),
            problems: report.problems,
        });
        *self
            .active
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(Arc::clone(&discovered));

        let evicted = self.loader.retain(|key| index.contains(key));
        for key in &evicted {
            debug!("Evicted cached adapter {} (manifest removed)", key);
        }

        let capabilities = index.capabilities();
        info!(
            "Adapter registry ready: {} adapters across {} capabilities ({} problems, {} evicted)",
            index.len(),
            capabilities.len(),
            discovered.problems.len(),
            evicted.len()
        );

        Ok(DiscoveryReport {
            capabilities,
            adapters: index.len(),
            problems: discovered.problems.clone(),
            evicted,
        })
    }

    fn current(&self) -> Option<Arc<Discovered>> {
        self.active
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Active index, if discovery has succeeded at least once
    pub fn index(&self) -> Option<Arc<CapabilityIndex>> {
        self.current().map(|discovered| Arc::clone(&discovered.index))
    }

    pub fn state(&self) -> RegistryState {
        match self.current() {
            Some(_) => RegistryState::Ready,
            None => RegistryState::Uninitialized,
        }
    }

    /// Sorted capabilities; empty before discovery
    pub fn all_capabilities(&self) -> Vec<String> {
        self.index()
            .map(|index| index.capabilities())
            .unwrap_or_default()
    }

    /// Sorted providers of `capability`; empty if unknown or before discovery
    pub fn providers(&self, capability: &str) -> Vec<String> {
        self.index()
            .map(|index| index.providers(capability))
            .unwrap_or_default()
    }

    pub fn manifest(&self, capability: &str, provider: &str) -> Option<Arc<Manifest>> {
        self.index()?.manifest(capability, provider)
    }

    /// Problems reported by the discovery that produced the active index
    pub fn last_problems(&self) -> Vec<ScanProblem> {
        self.current()
            .map(|discovered| discovered.problems.clone())
            .unwrap_or_default()
    }

    /// Resolve the adapter for (capability, provider), loading it on first use
    pub async fn load_adapter(
        &self,
        capability: &str,
        provider: &str,
    ) -> RegistryResult<AdapterHandle> {
        let manifest = self
            .manifest(capability, provider)
            .ok_or_else(|| RegistryError::not_found(capability, provider))?;
        let adapter = self.loader.resolve(&manifest).await?;

        // A discovery may have dropped this manifest while we were loading
        self.discard_if_removed(&manifest.key());
        Ok(adapter)
    }

    /// Evict `key` from the adapter cache if the active index no longer has it
    fn discard_if_removed(&self, key: &AdapterKey) {
        let present = self.index().is_some_and(|index| index.contains(key));
        if !present && self.loader.evict(key) {
            debug!("Evicted adapter {} loaded against a superseded index", key);
        }
    }

    /// Whether (capability, provider) has a cached instance
    pub fn is_loaded(&self, capability: &str, provider: &str) -> bool {
        self.loader
            .is_cached(&AdapterKey::new(capability, provider))
    }

    pub fn loaded_adapters(&self) -> Vec<AdapterKey> {
        self.loader.cached_keys()
    }

    /// Drop every cached adapter; the index is kept
    pub fn reset(&self) {
        info!("Clearing adapter cache");
        self.loader.clear();
    }
}
