//! Registry error types.

use thiserror::Error;

/// Errors that can occur when registering prebuilt machines
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A machine with this name already exists in the registry
    #[error("Machine '{name}' is already registered")]
    AlreadyRegistered { name: String },
}
