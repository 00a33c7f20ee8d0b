//! Hot Re-discovery
//!
//! Watches the scan root and re-runs discovery when descriptors change.

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::AdapterRegistry;
use crate::common::{RegistryError, RegistryResult};

/// Running watcher; stops when dropped
pub struct WatcherHandle {
    task: JoinHandle<()>,
}

impl WatcherHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl AdapterRegistry {
    /// Start a filesystem watcher that re-discovers on change.
    ///
    /// Events are debounced by `watch_debounce_ms`. A failed re-discovery is
    /// logged and leaves the current index in place.
    pub fn start_watcher(self: Arc<Self>) -> RegistryResult<WatcherHandle> {
        let root = self.config().scan_root.clone();
        let debounce = self.config().watch_debounce();

        info!("Starting adapter manifest watcher on {:?}", root);

        let (tx, mut rx) = tokio::sync::mpsc::channel::<Event>(100);

        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = tx.blocking_send(event);
                }
            })
            .map_err(|e| RegistryError::Watcher(format!("Failed to create watcher: {}", e)))?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|e| {
                RegistryError::Watcher(format!("Failed to watch {:?}: {}", root, e))
            })?;

        let task = tokio::spawn(async move {
            // Keep watcher alive
            let _watcher = watcher;

            while let Some(event) = rx.recv().await {
                if event.kind.is_access() {
                    continue;
                }
                debug!("Adapter manifest event: {:?}", event);

                tokio::time::sleep(debounce).await;

                // Drain anything that arrived during the debounce window
                while rx.try_recv().is_ok() {}

                info!("Adapter manifests changed, re-discovering");
                match self.discover().await {
                    Ok(report) => info!(
                        "Re-discovery complete: {} adapters, {} problems",
                        report.adapters,
                        report.problems.len()
                    ),
                    Err(e) => warn!("Re-discovery failed, keeping previous index: {}", e),
                }
            }
        });

        Ok(WatcherHandle { task })
    }
}
