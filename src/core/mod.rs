//! Core types the machine is built from.
//!
//! This module contains the pure pieces of a flop:
//! - Labels via the `Label` trait
//! - The derivation function mapping a state bag to a label
//! - Bounded transition history
//!
//! Nothing in here holds a lock or runs a user callback.

mod derivation;
mod history;
mod label;

pub use derivation::Derivation;
pub use history::{Cause, StateHistory, StateTransition, DEFAULT_HISTORY_LIMIT};
pub use label::Label;
