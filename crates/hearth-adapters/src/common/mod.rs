//! Common Utilities
//!
//! Shared error handling and path helpers.

pub mod error;
pub mod paths;
pub mod result;

pub use error::{ErrorKind, RegistryError};
pub use paths::{default_adapter_root, default_config_path, hearth_dir, ADAPTER_ROOT_ENV};
pub use result::RegistryResult;
