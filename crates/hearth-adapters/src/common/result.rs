//! Common Result Type
//!
//! Type alias for registry results.

use super::error::RegistryError;

/// Registry result type
pub type RegistryResult<T> = Result<T, RegistryError>;
