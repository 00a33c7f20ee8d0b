//! Adapter Resolution
//!
//! Deferred adapter modules, the export resolution strategy, and the
//! single-flight loader cache.

pub mod loader;
pub mod module;
pub mod strategy;

pub use loader::AdapterLoader;
pub use module::{
    loader_fn, Adapter, AdapterFactory, AdapterHandle, AdapterModule, Export, FnLoader,
    ModuleCatalog, ModuleLoader,
};
pub use strategy::{provider_export_name, ExportLookup, ResolutionStrategy, EXPORT_SUFFIX};
