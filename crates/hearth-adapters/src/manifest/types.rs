//! Manifest Types
//!
//! Adapter descriptors as read from disk, and their validated in-memory form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapter::{ModuleCatalog, ModuleLoader};

/// Identity of an adapter across the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AdapterKey {
    pub capability: String,
    pub provider: String,
}

impl AdapterKey {
    pub fn new(capability: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            provider: provider.into(),
        }
    }
}

impl fmt::Display for AdapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.capability, self.provider)
    }
}

/// Validated adapter manifest
#[derive(Clone)]
pub struct Manifest {
    pub capability: String,
    pub provider: String,
    pub display_name: String,
    /// Catalog name the loader was resolved from
    pub loader_name: String,
    pub loader: Arc<dyn ModuleLoader>,
    /// Opaque, never validated
    pub metadata: Value,
    /// Remaining top-level descriptor fields
    pub extra: Map<String, Value>,
    /// File the descriptor was read from
    pub source: PathBuf,
}

impl Manifest {
    pub fn key(&self) -> AdapterKey {
        AdapterKey::new(&self.capability, &self.provider)
    }

    pub fn summary(&self) -> ManifestSummary {
        ManifestSummary {
            capability: self.capability.clone(),
            provider: self.provider.clone(),
            display_name: self.display_name.clone(),
            loader: self.loader_name.clone(),
            source: self.source.clone(),
        }
    }
}

impl fmt::Debug for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manifest")
            .field("capability", &self.capability)
            .field("provider", &self.provider)
            .field("display_name", &self.display_name)
            .field("loader", &self.loader_name)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Serializable view of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestSummary {
    pub capability: String,
    pub provider: String,
    pub display_name: String,
    pub loader: String,
    pub source: PathBuf,
}

/// Why a candidate descriptor was excluded from the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProblem {
    pub path: PathBuf,
    /// Known when the descriptor got far enough to name itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<AdapterKey>,
    pub reason: String,
}

impl ScanProblem {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            identity: None,
            reason: reason.into(),
        }
    }

    pub fn with_identity(mut self, identity: Option<AdapterKey>) -> Self {
        self.identity = identity;
        self
    }
}

impl fmt::Display for ScanProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.identity {
            Some(key) => write!(f, "{:?} ({}): {}", self.path, key, self.reason),
            None => write!(f, "{:?}: {}", self.path, self.reason),
        }
    }
}

/// Validation failure for a single descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invalid {
    pub identity: Option<AdapterKey>,
    pub reason: String,
}

impl Invalid {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            identity: None,
            reason: reason.into(),
        }
    }
}

/// Parse and validate a descriptor.
///
/// Required: `capability`, `provider`, `displayName`, `loader`. Optional
/// `metadata` is passed through; any other keys land in `extra`.
pub fn parse_manifest(
    source: &Path,
    content: &str,
    catalog: &ModuleCatalog,
) -> Result<Manifest, Invalid> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| Invalid::new(format!("Failed to parse JSON: {}", e)))?;

    let Value::Object(mut fields) = value else {
        return Err(Invalid::new("Manifest must be a JSON object"));
    };

    let capability = take_identifier(&mut fields, "capability")?;
    let provider = take_identifier(&mut fields, "provider")?;
    let identity = Some(AdapterKey::new(&capability, &provider));
    let with_identity = |reason: String| Invalid {
        identity: identity.clone(),
        reason,
    };

    let display_name = take_string(&mut fields, "displayName").map_err(&with_identity)?;
    if display_name.trim().is_empty() {
        return Err(with_identity("`displayName` must not be empty".to_string()));
    }

    let loader_name = take_string(&mut fields, "loader").map_err(&with_identity)?;
    let loader = catalog
        .get(&loader_name)
        .ok_or_else(|| with_identity(format!("Loader `{}` is not registered", loader_name)))?;

    let metadata = fields.remove("metadata").unwrap_or(Value::Null);

    Ok(Manifest {
        capability,
        provider,
        display_name,
        loader_name,
        loader,
        metadata,
        extra: fields,
        source: source.to_path_buf(),
    })
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Result<String, String> {
    match fields.remove(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(format!("`{}` must be a string", key)),
        None => Err(format!("Missing required field `{}`", key)),
    }
}

fn take_identifier(fields: &mut Map<String, Value>, key: &str) -> Result<String, Invalid> {
    let value = take_string(fields, key).map_err(Invalid::new)?;
    if !is_valid_identifier(&value) {
        return Err(Invalid::new(format!("Invalid {} identifier: {:?}", key, value)));
    }
    Ok(value)
}

/// Capability and provider ids: ASCII alphanumeric first, then alphanumerics, `_` or `-`
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{loader_fn, AdapterModule};
    use serde_json::json;

    fn catalog() -> ModuleCatalog {
        ModuleCatalog::new().with("plex", loader_fn(|| async { Ok(AdapterModule::new()) }))
    }

    fn parse(value: Value) -> Result<Manifest, Invalid> {
        parse_manifest(Path::new("media/plex/manifest.json"), &value.to_string(), &catalog())
    }

    #[test]
    fn test_valid_manifest() {
        let manifest = parse(json!({
            "capability": "media",
            "provider": "plex",
            "displayName": "Plex",
            "loader": "plex",
            "metadata": {"icon": "plex.svg"},
            "version": "2.1.0"
        }))
        .expect("valid");

        assert_eq!(manifest.key(), AdapterKey::new("media", "plex"));
        assert_eq!(manifest.display_name, "Plex");
        assert_eq!(manifest.metadata["icon"], "plex.svg");
        assert_eq!(manifest.extra.get("version"), Some(&json!("2.1.0")));
        assert!(!manifest.extra.contains_key("capability"));
    }

    #[test]
    fn test_missing_display_name_keeps_identity() {
        let err = parse(json!({
            "capability": "media",
            "provider": "plex",
            "loader": "plex"
        }))
        .unwrap_err();
        assert_eq!(err.identity, Some(AdapterKey::new("media", "plex")));
        assert!(err.reason.contains("displayName"));
    }

    #[test]
    fn test_blank_display_name() {
        let err = parse(json!({
            "capability": "media",
            "provider": "plex",
            "displayName": "   ",
            "loader": "plex"
        }))
        .unwrap_err();
        assert!(err.reason.contains("must not be empty"));
    }

    #[test]
    fn test_wrong_shapes() {
        let err = parse(json!({"capability": 7, "provider": "plex"})).unwrap_err();
        assert_eq!(err.identity, None);
        assert!(err.reason.contains("`capability` must be a string"));

        let err = parse(json!({
            "capability": "media",
            "provider": "plex",
            "displayName": "Plex",
            "loader": {"module": "plex"}
        }))
        .unwrap_err();
        assert!(err.reason.contains("`loader` must be a string"));

        let err = parse(json!(["not", "an", "object"])).unwrap_err();
        assert!(err.reason.contains("JSON object"));
    }

    #[test]
    fn test_unregistered_loader() {
        let err = parse(json!({
            "capability": "media",
            "provider": "jellyfin",
            "displayName": "Jellyfin",
            "loader": "jellyfin"
        }))
        .unwrap_err();
        assert!(err.reason.contains("not registered"));
        assert_eq!(err.identity, Some(AdapterKey::new("media", "jellyfin")));
    }

    #[test]
    fn test_invalid_json() {
        let err = parse_manifest(Path::new("x.json"), "{ nope", &catalog()).unwrap_err();
        assert!(err.reason.starts_with("Failed to parse JSON"));
    }

    #[test]
    fn test_identifier_rules() {
        assert!(is_valid_identifier("home_automation"));
        assert!(is_valid_identifier("google-calendar"));
        assert!(!is_valid_identifier(""));
        assert!(is_valid_identifier("1password"));
        assert!(!is_valid_identifier("_private"));
        assert!(!is_valid_identifier("media/plex"));
        assert!(!is_valid_identifier("plex "));
    }
}
