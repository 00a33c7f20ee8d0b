//! Configuration management
//!
//! Registry settings: where to scan, descriptor size cap, watcher debounce
//! and the export resolution order.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::adapter::ResolutionStrategy;
use crate::common::paths::{default_adapter_root, default_config_path, ADAPTER_ROOT_ENV};
use crate::common::{RegistryError, RegistryResult};
use crate::manifest::DEFAULT_MAX_MANIFEST_BYTES;

const DEFAULT_WATCH_DEBOUNCE_MS: u64 = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub scan_root: PathBuf,
    pub max_manifest_bytes: u64,
    pub watch_debounce_ms: u64,
    pub resolution: ResolutionStrategy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            scan_root: default_adapter_root(),
            max_manifest_bytes: DEFAULT_MAX_MANIFEST_BYTES,
            watch_debounce_ms: DEFAULT_WATCH_DEBOUNCE_MS,
            resolution: ResolutionStrategy::default(),
        }
    }
}

impl RegistryConfig {
    /// Config scanning `root` with every other setting at its default
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            scan_root: root.into(),
            ..Self::default()
        }
    }

    /// Read a JSON config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> RegistryResult<Self> {
        let config_error = |reason: String| RegistryError::Config {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| config_error(format!("Failed to read config: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| config_error(format!("Failed to parse config JSON: {}", e)))
    }

    /// `~/.hearth/adapters.json` if present, else defaults; then env overrides.
    pub fn load() -> RegistryResult<Self> {
        let config = match default_config_path() {
            Some(path) if path.exists() => {
                debug!("Reading registry config from {:?}", path);
                Self::from_file(&path)?
            }
            _ => Self::default(),
        };
        Ok(config.with_env_overrides())
    }

    /// Apply `HEARTH_ADAPTER_ROOT` if set and non-empty
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(root) = std::env::var_os(ADAPTER_ROOT_ENV).filter(|v| !v.is_empty()) {
            self.scan_root = PathBuf::from(root);
        }
        self
    }

    pub fn watch_debounce(&self) -> Duration {
        Duration::from_millis(self.watch_debounce_ms)
    }
}
