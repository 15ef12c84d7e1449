//! Machine instances ("flops").
//!
//! # Key Concepts
//!
//! - **Machine**: the single-threaded core; configuration and mutation
//!   methods take `&mut self` and return `&mut Self`
//! - **Flop**: a cloneable, lockable handle around a machine; the same
//!   methods take `&self` and return `&Self`
//! - **Step**: what a strict `try_init`/`try_trigger` did
//!
//! Transitions are never declared. After `init` or an action, the machine
//! re-derives its label from the bag; a different label is a transition and
//! fires the entry callback registered for it.

mod handle;
mod instance;
mod step;

pub use handle::Flop;
pub use instance::{ActionHandler, EntryCallback, Machine};
pub use step::{FlopError, Step};
