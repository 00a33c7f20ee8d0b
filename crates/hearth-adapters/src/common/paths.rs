//! Path Utilities
//!
//! Common path resolution for Hearth directories.

use std::path::PathBuf;

/// Environment variable overriding the adapter scan root
pub const ADAPTER_ROOT_ENV: &str = "HEARTH_ADAPTER_ROOT";

/// Get the Hearth base directory (`~/.hearth/`)
pub fn hearth_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".hearth"))
}

/// Get the default adapter scan root (`~/.hearth/adapters`)
///
/// Falls back to a relative `adapters` directory when no home directory
/// can be determined (containers, service accounts).
pub fn default_adapter_root() -> PathBuf {
    hearth_dir()
        .map(|dir| dir.join("adapters"))
        .unwrap_or_else(|| PathBuf::from("adapters"))
}

/// Get the default config file path (`~/.hearth/adapters.json`)
pub fn default_config_path() -> Option<PathBuf> {
    hearth_dir().map(|dir| dir.join("adapters.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_adapter_root() {
        let root = default_adapter_root();
        assert!(root.ends_with("adapters"));
    }
}
