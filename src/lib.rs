//! Flipflop: declarative named state machines
//!
//! A flop keeps a state bag, a set of named actions that mutate it, and a
//! pure derivation that maps the bag to a label. There is no transition
//! table: after every `init` or action the label is re-derived, and when it
//! differs from the previous one the entry callback for the new label fires,
//! exactly once per transition.
//!
//! # Core Concepts
//!
//! - **Registry**: one machine per name, created on first lookup
//! - **Machine / Flop**: the machine itself and a shared handle to it
//! - **Derivation**: pure function from state bag to label
//! - **Gate**: `reject_events` turns every trigger into a no-op until
//!   `accept_events`
//!
//! Misuse never fails the chainable calls: a closed gate, an unbound
//! action or a missing entry callback are all silent no-ops. The
//! `try_init`/`try_trigger` forms report them instead.
//!
//! # Example
//!
//! ```rust
//! use flipflop::Registry;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! #[derive(Default, Clone)]
//! struct Counter {
//!     count: u32,
//! }
//!
//! let registry: Registry<Counter, &'static str> = Registry::new();
//! let ready = Arc::new(AtomicUsize::new(0));
//! let seen = Arc::clone(&ready);
//!
//! registry
//!     .machine("counter")
//!     .derive(|c: &Counter| if c.count >= 3 { "ready" } else { "waiting" })
//!     .bind("increment", |c: &mut Counter, _: ()| c.count += 1)
//!     .on("ready", move |_: &Counter| {
//!         seen.fetch_add(1, Ordering::SeqCst);
//!     })
//!     .init(Counter { count: 0 });
//!
//! let counter = registry.machine("counter");
//! for _ in 0..4 {
//!     counter.trigger("increment", ());
//! }
//!
//! assert_eq!(counter.state().count, 4);
//! assert_eq!(counter.current_label(), Some("ready"));
//! assert_eq!(ready.load(Ordering::SeqCst), 1);
//! ```

extern crate self as flipflop;

pub mod builder;
pub mod config;
pub mod core;
pub mod machine;
pub mod registry;

// Re-export commonly used types
pub use config::FlopConfig;
pub use self::core::{Derivation, Label, StateHistory, StateTransition};
pub use machine::{Flop, FlopError, Machine, Step};
pub use registry::{global, machine, JsonBag, JsonFlop, JsonRegistry, Registry, RegistryError};

#[doc(hidden)]
pub use serde as __serde;
