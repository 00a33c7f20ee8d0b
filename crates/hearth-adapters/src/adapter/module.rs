//! Adapter Modules
//!
//! What a deferred loader hands back: a module-like set of exports, one of
//! which is expected to construct the adapter.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::manifest::Manifest;

/// A resolved, ready-to-use adapter.
///
/// Adapters are opaque to the registry; consumers downcast through
/// [`Adapter::as_any`] to the concrete client they expect.
pub trait Adapter: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl dyn Adapter {
    /// Downcast to a concrete adapter type
    pub fn downcast_ref<T: Adapter>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Shared adapter instance as cached by the loader
pub type AdapterHandle = Arc<dyn Adapter>;

/// Constructor for an adapter, given its manifest
pub type AdapterFactory = Arc<dyn Fn(&Manifest) -> Result<AdapterHandle, String> + Send + Sync>;

/// One export of an adapter module
#[derive(Clone)]
pub enum Export {
    /// Usable constructor
    Factory(AdapterFactory),
    /// Anything else a module may export (constants, descriptors, ...)
    Value(Value),
}

impl Export {
    pub fn factory<F>(f: F) -> Self
    where
        F: Fn(&Manifest) -> Result<AdapterHandle, String> + Send + Sync + 'static,
    {
        Export::Factory(Arc::new(f))
    }

    pub fn as_factory(&self) -> Option<&AdapterFactory> {
        match self {
            Export::Factory(factory) => Some(factory),
            Export::Value(_) => None,
        }
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Export::Factory(_) => f.write_str("Factory(..)"),
            Export::Value(value) => f.debug_tuple("Value").field(value).finish(),
        }
    }
}

/// Module-like object returned by a [`ModuleLoader`]
#[derive(Debug, Clone, Default)]
pub struct AdapterModule {
    exports: HashMap<String, Export>,
    default: Option<Export>,
}

impl AdapterModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_export(mut self, name: impl Into<String>, export: Export) -> Self {
        self.exports.insert(name.into(), export);
        self
    }

    pub fn with_default(mut self, export: Export) -> Self {
        self.default = Some(export);
        self
    }

    /// Look up a named export
    pub fn export(&self, name: &str) -> Option<&Export> {
        self.exports.get(name)
    }

    pub fn default_export(&self) -> Option<&Export> {
        self.default.as_ref()
    }

    /// Names of all named exports, sorted
    pub fn export_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.exports.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Deferred loader for an adapter module.
///
/// Invoked at most once per successful resolution; any one-time setup
/// (client construction, credential lookup) belongs here.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(&self) -> Result<AdapterModule, String>;
}

/// [`ModuleLoader`] backed by an async closure
pub struct FnLoader<F>(F);

impl<F> FnLoader<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> ModuleLoader for FnLoader<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<AdapterModule, String>> + Send + 'static,
{
    async fn load(&self) -> Result<AdapterModule, String> {
        (self.0)().await
    }
}

/// Wrap an async closure as a shareable loader
pub fn loader_fn<F, Fut>(f: F) -> Arc<dyn ModuleLoader>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<AdapterModule, String>> + Send + 'static,
{
    Arc::new(FnLoader::new(f))
}

/// Named deferred loaders supplied by the host application.
///
/// Manifests reference loaders by name; a manifest whose loader is not in
/// the catalog fails validation during the scan.
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    loaders: HashMap<String, Arc<dyn ModuleLoader>>,
    fallback: Option<Arc<dyn ModuleLoader>>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, loader: Arc<dyn ModuleLoader>) {
        self.loaders.insert(name.into(), loader);
    }

    pub fn with(mut self, name: impl Into<String>, loader: Arc<dyn ModuleLoader>) -> Self {
        self.register(name, loader);
        self
    }

    /// Loader used for any name not explicitly registered
    pub fn with_fallback(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.fallback = Some(loader);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ModuleLoader>> {
        self.loaders
            .get(name)
            .or(self.fallback.as_ref())
            .map(Arc::clone)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fallback.is_some() || self.loaders.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loaders.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleCatalog")
            .field("loaders", &self.names())
            .field("fallback", &self.fallback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Dummy;

    impl Adapter for Dummy {
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_module_exports() {
        let module = AdapterModule::new()
            .with_export("PlexAdapter", Export::factory(|_| Ok(Arc::new(Dummy) as AdapterHandle)))
            .with_export("VERSION", Export::Value(json!("1.2.0")))
            .with_default(Export::Value(json!(null)));

        assert!(module.export("PlexAdapter").and_then(Export::as_factory).is_some());
        assert!(module.export("VERSION").and_then(Export::as_factory).is_none());
        assert!(module.export("Missing").is_none());
        assert_eq!(module.export_names(), vec!["PlexAdapter", "VERSION"]);
    }

    #[test]
    fn test_downcast() {
        let handle: AdapterHandle = Arc::new(Dummy);
        assert!(handle.downcast_ref::<Dummy>().is_some());
    }

    #[tokio::test]
    async fn test_catalog_lookup_and_fallback() {
        let catalog = ModuleCatalog::new().with(
            "plex",
            loader_fn(|| async { Ok(AdapterModule::new()) }),
        );
        assert!(catalog.contains("plex"));
        assert!(!catalog.contains("openai"));
        assert!(catalog.get("openai").is_none());

        let loader = catalog.get("plex").expect("registered");
        assert!(loader.load().await.is_ok());

        let lenient = catalog.with_fallback(loader_fn(|| async { Err("unlinked".to_string()) }));
        assert!(lenient.contains("openai"));
        let err = lenient.get("openai").expect("fallback").load().await.unwrap_err();
        assert_eq!(err, "unlinked");
    }
}
