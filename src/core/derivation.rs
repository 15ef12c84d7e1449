//! Derivation functions that compute a machine's label from its state bag.
//!
//! A derivation is the only place transitions come from: there is no
//! transition table, the machine simply re-derives after every change and
//! compares with the label it had before.

use super::label::Label;
use std::fmt;

/// Pure function from a state bag to a label.
///
/// Returning `None` yields the sentinel label, the same value a machine
/// holds before its first `init`. The default derivation always returns
/// `None`.
///
/// # Example
///
/// ```rust
/// use flipflop::core::Derivation;
///
/// struct Counter {
///     count: u32,
/// }
///
/// let derivation = Derivation::new(|c: &Counter| {
///     if c.count >= 3 { "ready" } else { "waiting" }
/// });
///
/// assert_eq!(derivation.derive(&Counter { count: 0 }), Some("waiting"));
/// assert_eq!(derivation.derive(&Counter { count: 3 }), Some("ready"));
/// ```
pub struct Derivation<B, L: Label> {
    derive: Box<dyn Fn(&B) -> Option<L> + Send + Sync>,
}

impl<B, L: Label> Derivation<B, L> {
    /// Create a derivation from a pure function.
    ///
    /// The function must be deterministic for a given bag and must not
    /// mutate anything the bag refers to. It may return a label directly
    /// or an `Option` of one.
    pub fn new<F, R>(derive: F) -> Self
    where
        F: Fn(&B) -> R + Send + Sync + 'static,
        R: Into<Option<L>>,
    {
        Derivation {
            derive: Box::new(move |bag| derive(bag).into()),
        }
    }

    /// The derivation every machine starts with: always the sentinel.
    ///
    /// ```rust
    /// use flipflop::core::Derivation;
    ///
    /// let derivation: Derivation<u32, &'static str> = Derivation::unset();
    /// assert_eq!(derivation.derive(&7), None);
    /// ```
    pub fn unset() -> Self {
        Derivation {
            derive: Box::new(|_| None),
        }
    }

    /// Compute the label for this bag.
    pub fn derive(&self, bag: &B) -> Option<L> {
        (self.derive)(bag)
    }
}

impl<B, L: Label> Default for Derivation<B, L> {
    fn default() -> Self {
        Self::unset()
    }
}

impl<B, L: Label> fmt::Debug for Derivation<B, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derivation").finish_non_exhaustive()
    }
}
