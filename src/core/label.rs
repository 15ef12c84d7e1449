//! Label trait for the values a derivation can produce.
//!
//! A label identifies which logical state a machine occupies. The engine
//! only compares labels for equality and uses them as callback keys; it
//! never interprets them.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for state labels.
///
/// All methods are pure. Labels are plain values computed from a state bag
/// by the machine's derivation function.
///
/// # Required Traits
///
/// - `Clone`: the current label is stored and recorded in history
/// - `Eq` + `Hash`: labels key the entry callback map
/// - `Debug`: labels show up in diagnostics
/// - `Send` + `Sync`: machines can live behind a shared handle
///
/// Implementations are provided for `&'static str` and `String`. Enums can
/// use the [`label_enum!`](crate::label_enum) macro.
///
/// # Example
///
/// ```rust
/// use flipflop::core::Label;
///
/// #[derive(Clone, PartialEq, Eq, Hash, Debug)]
/// enum Door {
///     Open,
///     Closed,
///     Broken,
/// }
///
/// impl Label for Door {
///     fn name(&self) -> &str {
///         match self {
///             Self::Open => "Open",
///             Self::Closed => "Closed",
///             Self::Broken => "Broken",
///         }
///     }
///
///     fn is_final(&self) -> bool {
///         matches!(self, Self::Broken)
///     }
/// }
///
/// assert_eq!(Door::Open.name(), "Open");
/// assert!(Door::Broken.is_final());
/// ```
pub trait Label: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Get the label's name for display/logging.
    fn name(&self) -> &str;

    /// Check if this label is absorbing in the caller's domain.
    ///
    /// The engine does not enforce this; it is reported by
    /// `Machine::is_final` for the caller's benefit.
    ///
    /// Default implementation returns `false`.
    fn is_final(&self) -> bool {
        false
    }
}

impl Label for &'static str {
    fn name(&self) -> &str {
        self
    }
}

impl Label for String {
    fn name(&self) -> &str {
        self.as_str()
    }
}
