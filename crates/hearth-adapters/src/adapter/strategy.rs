//! Export Resolution Strategy
//!
//! Ordered list of lookups used to pick the adapter constructor out of a
//! loaded module. The first lookup that yields a factory wins.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::module::{AdapterFactory, AdapterModule};

/// Suffix appended to the provider-derived export name
pub const EXPORT_SUFFIX: &str = "Adapter";

/// A single lookup attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportLookup {
    /// Named export derived from the provider id (`plex` -> `PlexAdapter`)
    ProviderNamed,
    /// The module's default export
    Default,
}

impl fmt::Display for ExportLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportLookup::ProviderNamed => f.write_str("provider_named"),
            ExportLookup::Default => f.write_str("default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionStrategy {
    steps: Vec<ExportLookup>,
}

impl Default for ResolutionStrategy {
    fn default() -> Self {
        Self {
            steps: vec![ExportLookup::ProviderNamed, ExportLookup::Default],
        }
    }
}

impl ResolutionStrategy {
    pub fn new(steps: Vec<ExportLookup>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[ExportLookup] {
        &self.steps
    }

    /// Pick the first usable factory, with the lookup that found it.
    ///
    /// An export that exists but is not a factory does not stop the search.
    pub fn select<'m>(
        &self,
        module: &'m AdapterModule,
        provider: &str,
    ) -> Option<(ExportLookup, &'m AdapterFactory)> {
        self.steps.iter().find_map(|step| {
            let export = match step {
                ExportLookup::ProviderNamed => module.export(&provider_export_name(provider)),
                ExportLookup::Default => module.default_export(),
            }?;
            export.as_factory().map(|factory| (*step, factory))
        })
    }

    /// Human-readable list of what was tried, for error messages
    pub fn describe(&self, provider: &str) -> String {
        self.steps
            .iter()
            .map(|step| match step {
                ExportLookup::ProviderNamed => {
                    format!("export `{}`", provider_export_name(provider))
                }
                ExportLookup::Default => "default export".to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Derive the conventional export name for a provider.
///
/// Segments separated by `_` or `-` are capitalised and joined, then
/// [`EXPORT_SUFFIX`] is appended.
pub fn provider_export_name(provider: &str) -> String {
    let mut name: String = provider
        .split(['_', '-'])
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    name.push_str(EXPORT_SUFFIX);
    name
}
