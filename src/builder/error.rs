//! Build errors for the machine builder.

use thiserror::Error;

/// Errors that can occur when building a machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Machine name not specified. Call .name(name) before .build()")]
    MissingName,

    #[error("Machine name is empty. Names must contain a non-whitespace character")]
    EmptyName,
}
