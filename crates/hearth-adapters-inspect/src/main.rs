use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Parser;
use hearth_adapters::{
    loader_fn, AdapterRegistry, ManifestSummary, ModuleCatalog, RegistryConfig, ScanProblem,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hearth-adapters-inspect")]
struct Args {
    /// Adapter scan root (overrides config and HEARTH_ADAPTER_ROOT)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Registry config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Exit non-zero if any descriptor was rejected
    #[arg(long)]
    strict: bool,
}

#[derive(Serialize)]
struct Inventory {
    scan_root: PathBuf,
    capabilities: BTreeMap<String, Vec<ManifestSummary>>,
    problems: Vec<ScanProblem>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the JSON inventory, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RegistryConfig::from_file(path)?.with_env_overrides(),
        None => RegistryConfig::load()?,
    };
    if let Some(root) = args.root {
        config.scan_root = root;
    }

    // No adapter code is linked into this tool: accept every loader name so
    // descriptors validate, and refuse to actually load anything.
    let catalog = ModuleCatalog::new().with_fallback(loader_fn(|| async {
        Err("adapter code is not linked into hearth-adapters-inspect".to_string())
    }));

    let registry = AdapterRegistry::new(config, catalog);
    let report = registry.discover().await?;
    info!(
        "Discovered {} adapters across {} capabilities",
        report.adapters,
        report.capabilities.len()
    );
    for problem in &report.problems {
        warn!("Rejected descriptor {}", problem);
    }

    let mut capabilities = BTreeMap::new();
    for capability in registry.all_capabilities() {
        let manifests: Vec<ManifestSummary> = registry
            .providers(&capability)
            .iter()
            .filter_map(|provider| registry.manifest(&capability, provider))
            .map(|manifest| manifest.summary())
            .collect();
        capabilities.insert(capability, manifests);
    }

    let inventory = Inventory {
        scan_root: registry.config().scan_root.clone(),
        capabilities,
        problems: report.problems,
    };
    println!("{}", serde_json::to_string_pretty(&inventory)?);

    if args.strict && !inventory.problems.is_empty() {
        anyhow::bail!("{} adapter descriptor(s) rejected", inventory.problems.len());
    }

    Ok(())
}
