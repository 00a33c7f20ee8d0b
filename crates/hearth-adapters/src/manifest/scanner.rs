//! Manifest Scanner
//!
//! Walks the scan root, parses and validates every descriptor, and reports
//! per-file problems without failing the scan.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

use super::types::{parse_manifest, Manifest, ScanProblem};
use crate::adapter::ModuleCatalog;
use crate::common::{RegistryError, RegistryResult};

/// Default cap on descriptor size (1MB)
pub const DEFAULT_MAX_MANIFEST_BYTES: u64 = 1_000_000;

/// Result of one scan
#[derive(Debug, Default)]
pub struct ScanReport {
    pub manifests: Vec<Manifest>,
    pub problems: Vec<ScanProblem>,
}

pub struct ManifestScanner {
    root: PathBuf,
    max_manifest_bytes: u64,
    catalog: Arc<ModuleCatalog>,
}

impl ManifestScanner {
    pub fn new(root: impl Into<PathBuf>, catalog: Arc<ModuleCatalog>) -> Self {
        Self {
            root: root.into(),
            max_manifest_bytes: DEFAULT_MAX_MANIFEST_BYTES,
            catalog,
        }
    }

    pub fn with_max_manifest_bytes(mut self, max: u64) -> Self {
        self.max_manifest_bytes = max;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan the root for descriptors.
    ///
    /// Only an inaccessible root is an error. Loaders are never invoked.
    pub async fn scan(&self) -> RegistryResult<ScanReport> {
        let meta = fs::metadata(&self.root)
            .await
            .map_err(|e| RegistryError::scan_root(&self.root, e))?;
        if !meta.is_dir() {
            return Err(RegistryError::scan_root(&self.root, "not a directory"));
        }

        let mut report = ScanReport::default();
        let mut candidates = Vec::new();
        self.collect_candidates(&mut candidates, &mut report.problems)
            .await?;

        // Sorted so problem order and duplicate reports are deterministic
        candidates.sort();

        for path in candidates {
            match self.load_candidate(&path).await {
                Ok(manifest) => {
                    debug!(
                        "Loaded manifest: {} ({}) from {:?}",
                        manifest.display_name,
                        manifest.key(),
                        path
                    );
                    report.manifests.push(manifest);
                }
                Err(problem) => {
                    warn!("Skipping manifest {}", problem);
                    report.problems.push(problem);
                }
            }
        }

        info!(
            "Scanned {:?}: {} manifests, {} problems",
            self.root,
            report.manifests.len(),
            report.problems.len()
        );
        Ok(report)
    }

    /// Gather `*.json` files below the root.
    ///
    /// Entry types are read without following symlinks, so linked
    /// directories are not descended into.
    async fn collect_candidates(
        &self,
        candidates: &mut Vec<PathBuf>,
        problems: &mut Vec<ScanProblem>,
    ) -> RegistryResult<()> {
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if dir == self.root => return Err(RegistryError::scan_root(&dir, e)),
                Err(e) => {
                    problems.push(ScanProblem::new(
                        &dir,
                        format!("Failed to read directory: {}", e),
                    ));
                    continue;
                }
            };

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        problems.push(ScanProblem::new(
                            &dir,
                            format!("Failed to read entry: {}", e),
                        ));
                        break;
                    }
                };
                let path = entry.path();

                // Skip dotfiles and editor/atomic-write leftovers
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    if name.starts_with('.') || name.ends_with(".tmp") || name.ends_with(".swp") {
                        continue;
                    }
                }

                let file_type = match entry.file_type().await {
                    Ok(file_type) => file_type,
                    Err(e) => {
                        problems.push(ScanProblem::new(
                            &path,
                            format!("Failed to stat entry: {}", e),
                        ));
                        continue;
                    }
                };

                if file_type.is_dir() {
                    pending.push(path);
                } else if path.extension().and_then(|s| s.to_str()) == Some("json") {
                    candidates.push(path);
                }
            }
        }

        Ok(())
    }

    async fn load_candidate(&self, path: &Path) -> Result<Manifest, ScanProblem> {
        let metadata = fs::metadata(path)
            .await
            .map_err(|e| ScanProblem::new(path, format!("Failed to stat file: {}", e)))?;
        if metadata.len() > self.max_manifest_bytes {
            return Err(ScanProblem::new(
                path,
                format!(
                    "Manifest file too large ({} bytes, max {})",
                    metadata.len(),
                    self.max_manifest_bytes
                ),
            ));
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ScanProblem::new(path, format!("Failed to read file: {}", e)))?;

        parse_manifest(path, &content, &self.catalog)
            .map_err(|invalid| ScanProblem::new(path, invalid.reason).with_identity(invalid.identity))
    }
}
