//! Manifest System
//!
//! Discovers and validates adapter descriptors and indexes them by
//! capability and provider.

pub mod index;
pub mod scanner;
pub mod types;

pub use index::CapabilityIndex;
pub use scanner::{ManifestScanner, ScanReport, DEFAULT_MAX_MANIFEST_BYTES};
pub use types::{parse_manifest, AdapterKey, Manifest, ManifestSummary, ScanProblem};
