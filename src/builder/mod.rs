//! Builder API for assembling a machine in one expression.
//!
//! The chainable methods on `Machine` already configure a machine in
//! place; the builder adds validation and lets a fully configured machine
//! be handed to `Registry::register`.

pub mod error;
pub mod machine;
pub mod macros;

pub use error::BuildError;
pub use machine::MachineBuilder;
