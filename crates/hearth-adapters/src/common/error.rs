//! Common Error Types
//!
//! Unified error handling for discovery, indexing and adapter resolution.

use std::path::PathBuf;

/// Coarse error classification, stable across releases.
///
/// Consumers match on this rather than on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The scan root could not be accessed
    ScanRoot,
    /// Two manifests claimed the same (capability, provider)
    DuplicateProvider,
    /// Lookup against an unknown (capability, provider)
    NotFound,
    /// Loader failed or exposed no usable adapter
    Resolution,
    /// Configuration file could not be read or parsed
    Config,
    /// Filesystem watcher could not be started
    Watcher,
}

impl ErrorKind {
    /// Whether the caller can reasonably try again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::ScanRoot | ErrorKind::Resolution)
    }
}

/// Registry error type.
///
/// `Clone` so a single failed load can be handed to every caller that was
/// waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("Cannot access scan root {path:?}: {reason}")]
    ScanRoot { path: PathBuf, reason: String },

    #[error(
        "Duplicate provider {capability}/{provider}: declared by {first:?} and {second:?}"
    )]
    DuplicateProvider {
        capability: String,
        provider: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Adapter not found: {capability}/{provider}")]
    NotFound {
        capability: String,
        provider: String,
    },

    #[error("Failed to resolve adapter {capability}/{provider}: {reason}")]
    Resolution {
        capability: String,
        provider: String,
        reason: String,
    },

    #[error("Invalid configuration {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Watcher error: {0}")]
    Watcher(String),
}

impl RegistryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::ScanRoot { .. } => ErrorKind::ScanRoot,
            RegistryError::DuplicateProvider { .. } => ErrorKind::DuplicateProvider,
            RegistryError::NotFound { .. } => ErrorKind::NotFound,
            RegistryError::Resolution { .. } => ErrorKind::Resolution,
            RegistryError::Config { .. } => ErrorKind::Config,
            RegistryError::Watcher(_) => ErrorKind::Watcher,
        }
    }

    pub fn scan_root(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ScanRoot {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn not_found(capability: &str, provider: &str) -> Self {
        Self::NotFound {
            capability: capability.to_string(),
            provider: provider.to_string(),
        }
    }

    pub fn resolution(capability: &str, provider: &str, reason: impl Into<String>) -> Self {
        Self::Resolution {
            capability: capability.to_string(),
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            RegistryError::not_found("media", "plex").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            RegistryError::resolution("ai", "openai", "boom").kind(),
            ErrorKind::Resolution
        );
        assert_eq!(
            RegistryError::scan_root("/nope", "missing").kind(),
            ErrorKind::ScanRoot
        );
    }

    #[test]
    fn test_display_names_identity() {
        let err = RegistryError::resolution("media", "plex", "no usable export");
        let msg = err.to_string();
        assert!(msg.contains("media/plex"));
        assert!(msg.contains("no usable export"));
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorKind::Resolution.is_retryable());
        assert!(!ErrorKind::DuplicateProvider.is_retryable());
        assert!(!ErrorKind::NotFound.is_retryable());
    }
}
