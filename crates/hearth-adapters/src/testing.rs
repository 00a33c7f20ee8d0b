//! Shared fixtures for unit tests.

use std::any::Any;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};

use crate::adapter::{
    loader_fn, provider_export_name, Adapter, AdapterHandle, AdapterModule, Export, ModuleCatalog,
    ModuleLoader,
};
use crate::manifest::Manifest;

/// Adapter that remembers which manifest built it
#[derive(Debug)]
pub struct Probe {
    pub capability: String,
    pub provider: String,
    pub tag: String,
}

impl Adapter for Probe {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Probe {
    pub fn export(tag: &str) -> Export {
        let tag = tag.to_string();
        Export::factory(move |manifest| {
            Ok(Arc::new(Probe {
                capability: manifest.capability.clone(),
                provider: manifest.provider.clone(),
                tag: tag.clone(),
            }) as AdapterHandle)
        })
    }
}

/// Loader exporting `<Provider>Adapter`, counting its invocations
pub fn counting_loader(
    provider: &str,
    delay: Duration,
) -> (Arc<dyn ModuleLoader>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let export_name = provider_export_name(provider);

    let loader = loader_fn(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        let export_name = export_name.clone();
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(AdapterModule::new().with_export(export_name, Probe::export("named")))
        }
    });
    (loader, calls)
}

pub fn manifest_with_loader(
    capability: &str,
    provider: &str,
    loader: Arc<dyn ModuleLoader>,
) -> Manifest {
    Manifest {
        capability: capability.to_string(),
        provider: provider.to_string(),
        display_name: format!("{} ({})", provider, capability),
        loader_name: provider.to_string(),
        loader,
        metadata: Value::Null,
        extra: Map::new(),
        source: Path::new(capability).join(provider).join("manifest.json"),
    }
}

pub fn manifest(capability: &str, provider: &str) -> Manifest {
    let (loader, _) = counting_loader(provider, Duration::ZERO);
    manifest_with_loader(capability, provider, loader)
}

/// Catalog with a probe loader registered under each name
pub fn catalog_for(names: &[&str]) -> ModuleCatalog {
    names.iter().fold(ModuleCatalog::new(), |catalog, name| {
        let (loader, _) = counting_loader(name, Duration::ZERO);
        catalog.with(*name, loader)
    })
}

pub fn write_file(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Write `<root>/<capability>/<provider>/manifest.json` using loader `<provider>`
pub fn write_manifest(root: &Path, capability: &str, provider: &str) {
    let body = json!({
        "capability": capability,
        "provider": provider,
        "displayName": format!("{} adapter", provider),
        "loader": provider,
    });
    write_file(
        root,
        &format!("{}/{}/manifest.json", capability, provider),
        &body.to_string(),
    );
}
