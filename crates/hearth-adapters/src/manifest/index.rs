//! Capability Index
//!
//! Immutable capability -> provider -> manifest map built from one scan.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::types::{AdapterKey, Manifest};
use crate::common::{RegistryError, RegistryResult};

/// Sorted, read-only view of the discovered adapters
#[derive(Debug, Default)]
pub struct CapabilityIndex {
    entries: BTreeMap<String, BTreeMap<String, Arc<Manifest>>>,
    len: usize,
}

impl CapabilityIndex {
    /// Build an index, rejecting any (capability, provider) declared twice.
    pub fn build(manifests: Vec<Manifest>) -> RegistryResult<Self> {
        let mut entries: BTreeMap<String, BTreeMap<String, Arc<Manifest>>> = BTreeMap::new();
        let mut len = 0;

        for manifest in manifests {
            let providers = entries.entry(manifest.capability.clone()).or_default();
            match providers.entry(manifest.provider.clone()) {
                Entry::Occupied(existing) => {
                    return Err(RegistryError::DuplicateProvider {
                        capability: manifest.capability,
                        provider: manifest.provider,
                        first: existing.get().source.clone(),
                        second: manifest.source,
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(Arc::new(manifest));
                    len += 1;
                }
            }
        }

        Ok(Self { entries, len })
    }

    /// All capabilities, sorted
    pub fn capabilities(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Providers of a capability, sorted; empty if the capability is unknown
    pub fn providers(&self, capability: &str) -> Vec<String> {
        self.entries
            .get(capability)
            .map(|providers| providers.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn manifest(&self, capability: &str, provider: &str) -> Option<Arc<Manifest>> {
        self.entries
            .get(capability)
            .and_then(|providers| providers.get(provider))
            .cloned()
    }

    pub fn contains(&self, key: &AdapterKey) -> bool {
        self.manifest(&key.capability, &key.provider).is_some()
    }

    /// Every indexed manifest, in (capability, provider) order
    pub fn manifests(&self) -> impl Iterator<Item = &Arc<Manifest>> {
        self.entries.values().flat_map(|providers| providers.values())
    }

    pub fn keys(&self) -> Vec<AdapterKey> {
        self.manifests().map(|manifest| manifest.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::manifest;

    #[test]
    fn test_sorted_capabilities_and_providers() {
        let index = CapabilityIndex::build(vec![
            manifest("media", "plex"),
            manifest("ai", "openai"),
            manifest("media", "filesystem"),
            manifest("home_automation", "home_assistant"),
            manifest("ai", "anthropic"),
        ])
        .unwrap();

        assert_eq!(index.len(), 5);
        assert_eq!(index.capabilities(), vec!["ai", "home_automation", "media"]);
        assert_eq!(index.providers("media"), vec!["filesystem", "plex"]);
        assert_eq!(index.providers("ai"), vec!["anthropic", "openai"]);
    }

    #[test]
    fn test_unknown_lookups_are_empty() {
        let index = CapabilityIndex::build(vec![manifest("media", "plex")]).unwrap();
        assert!(index.providers("nonexistent").is_empty());
        assert!(index.manifest("media", "nonexistent").is_none());
        assert!(index.manifest("nonexistent", "plex").is_none());
    }

    #[test]
    fn test_manifest_matches_its_keys() {
        let index = CapabilityIndex::build(vec![
            manifest("media", "plex"),
            manifest("ai", "openai"),
        ])
        .unwrap();
        for capability in index.capabilities() {
            for provider in index.providers(&capability) {
                let found = index.manifest(&capability, &provider).unwrap();
                assert_eq!(found.capability, capability);
                assert_eq!(found.provider, provider);
            }
        }
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut second = manifest("ai", "openai");
        second.source = "ai/openai-copy.json".into();

        let err = CapabilityIndex::build(vec![manifest("ai", "openai"), second]).unwrap_err();
        match err {
            RegistryError::DuplicateProvider {
                capability,
                provider,
                second,
                ..
            } => {
                assert_eq!(capability, "ai");
                assert_eq!(provider, "openai");
                assert_eq!(second, std::path::PathBuf::from("ai/openai-copy.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_index() {
        let index = CapabilityIndex::build(Vec::new()).unwrap();
        assert!(index.is_empty());
        assert!(index.capabilities().is_empty());
        assert!(index.keys().is_empty());
    }
}
