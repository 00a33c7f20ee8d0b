//! Hearth adapter discovery and capability registry.
//!
//! Finds adapter descriptors under a scan root, indexes them by capability
//! and provider, and loads each adapter lazily, at most once, on first use.
//!
//! ```ignore
//! let catalog = ModuleCatalog::new().with("plex", loader_fn(|| async {
//!     Ok(AdapterModule::new().with_export("PlexAdapter", Export::factory(PlexClient::from_manifest)))
//! }));
//! let registry = AdapterRegistry::new(RegistryConfig::load()?, catalog);
//! registry.discover().await?;
//! let plex = registry.load_adapter("media", "plex").await?;
//! ```

pub mod adapter;
pub mod common;
pub mod config;
pub mod manifest;
pub mod registry;

#[cfg(test)]
mod testing;

pub use adapter::{
    loader_fn, Adapter, AdapterHandle, AdapterModule, Export, ExportLookup, ModuleCatalog,
    ModuleLoader, ResolutionStrategy,
};
pub use common::{ErrorKind, RegistryError, RegistryResult};
pub use config::RegistryConfig;
pub use manifest::{AdapterKey, CapabilityIndex, Manifest, ManifestSummary, ScanProblem};
pub use registry::{AdapterRegistry, DiscoveryReport, RegistryState, WatcherHandle};
