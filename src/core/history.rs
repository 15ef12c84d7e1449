//! Transition history tracking.
//!
//! Every change of a machine's label is recorded with the label it left,
//! the label it entered, what caused the change and when it happened.

use super::label::Label;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// What caused a label change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cause {
    /// The state bag was replaced by `init`.
    Init,
    /// The named action ran.
    Action(String),
}

/// Record of a single label change.
///
/// `None` on either side is the sentinel label: `from` is `None` for the
/// first transition after creation, and `to` is `None` when the derivation
/// returned the sentinel.
///
/// # Example
///
/// ```rust
/// use flipflop::core::{Cause, StateTransition};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: Some("waiting"),
///     to: Some("ready"),
///     cause: Cause::Action("increment".to_string()),
///     timestamp: Utc::now(),
/// };
/// assert!(transition.entered("ready"));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition<L> {
    /// The label being left
    pub from: Option<L>,
    /// The label being entered
    pub to: Option<L>,
    /// What triggered the re-derivation
    pub cause: Cause,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
}

impl<L: Label> StateTransition<L> {
    /// Check whether this transition entered `label`.
    pub fn entered(&self, label: impl Into<L>) -> bool {
        self.to.as_ref() == Some(&label.into())
    }
}

/// Default number of transitions a history keeps.
pub const DEFAULT_HISTORY_LIMIT: usize = 64;

/// Ordered, bounded history of label changes.
///
/// When the history is full the oldest transition is dropped.
///
/// # Example
///
/// ```rust
/// use flipflop::core::{Cause, StateHistory, StateTransition};
/// use chrono::Utc;
///
/// let mut history = StateHistory::with_limit(8);
///
/// history.record(StateTransition {
///     from: None,
///     to: Some("waiting"),
///     cause: Cause::Init,
///     timestamp: Utc::now(),
/// });
/// history.record(StateTransition {
///     from: Some("waiting"),
///     to: Some("ready"),
///     cause: Cause::Action("increment".to_string()),
///     timestamp: Utc::now(),
/// });
///
/// let path = history.get_path();
/// assert_eq!(path, vec![None, Some(&"waiting"), Some(&"ready")]);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory<L> {
    transitions: VecDeque<StateTransition<L>>,
    limit: usize,
}

impl<L: Label> Default for StateHistory<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Label> StateHistory<L> {
    /// Create an empty history holding up to [`DEFAULT_HISTORY_LIMIT`] entries.
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    /// Create an empty history holding up to `limit` entries.
    ///
    /// A limit of zero disables recording.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
            limit,
        }
    }

    /// Record a transition, evicting the oldest one if the history is full.
    pub fn record(&mut self, transition: StateTransition<L>) {
        if self.limit == 0 {
            return;
        }
        if self.transitions.len() == self.limit {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Get the path of labels traversed.
    ///
    /// Returns the `from` label of the oldest retained transition, then the
    /// `to` label of each transition in order.
    pub fn get_path(&self) -> Vec<Option<&L>> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.front() {
            path.push(first.from.as_ref());
        }
        for transition in &self.transitions {
            path.push(transition.to.as_ref());
        }
        path
    }

    /// Calculate total duration from first to last retained transition.
    ///
    /// Returns `None` if there are no transitions.
    pub fn duration(&self) -> Option<Duration> {
        if let (Some(first), Some(last)) = (self.transitions.front(), self.transitions.back()) {
            let duration = last.timestamp.signed_duration_since(first.timestamp);
            duration.to_std().ok()
        } else {
            None
        }
    }

    /// Iterate over the retained transitions, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition<L>> {
        self.transitions.iter()
    }

    /// The most recent transition.
    pub fn last(&self) -> Option<&StateTransition<L>> {
        self.transitions.back()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    /// Maximum number of transitions retained.
    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition(from: Option<&'static str>, to: &'static str) -> StateTransition<&'static str> {
        StateTransition {
            from,
            to: Some(to),
            cause: Cause::Action("step".to_string()),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history: StateHistory<&'static str> = StateHistory::new();
        assert!(history.is_empty());
        assert!(history.get_path().is_empty());
        assert!(history.duration().is_none());
        assert_eq!(history.limit(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn record_adds_transition() {
        let mut history = StateHistory::new();
        history.record(transition(None, "waiting"));

        assert_eq!(history.len(), 1);
        assert_eq!(history.last().unwrap().to, Some("waiting"));
    }

    #[test]
    fn get_path_returns_label_sequence() {
        let mut history = StateHistory::new();
        history.record(transition(None, "a"));
        history.record(transition(Some("a"), "b"));
        history.record(transition(Some("b"), "c"));

        let path = history.get_path();
        assert_eq!(path, vec![None, Some(&"a"), Some(&"b"), Some(&"c")]);
    }

    #[test]
    fn full_history_drops_oldest() {
        let mut history = StateHistory::with_limit(2);
        history.record(transition(None, "a"));
        history.record(transition(Some("a"), "b"));
        history.record(transition(Some("b"), "c"));

        assert_eq!(history.len(), 2);
        let path = history.get_path();
        assert_eq!(path, vec![Some(&"a"), Some(&"b"), Some(&"c")]);
    }

    #[test]
    fn zero_limit_records_nothing() {
        let mut history = StateHistory::with_limit(0);
        history.record(transition(None, "a"));

        assert!(history.is_empty());
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let mut history = StateHistory::new();
        history.record(transition(None, "a"));

        std::thread::sleep(std::time::Duration::from_millis(10));

        history.record(transition(Some("a"), "b"));

        let duration = history.duration();
        assert!(duration.is_some());
        assert!(duration.unwrap() >= std::time::Duration::from_millis(10));
    }

    #[test]
    fn single_transition_has_duration_zero() {
        let mut history = StateHistory::new();
        history.record(transition(None, "a"));

        assert_eq!(history.duration(), Some(std::time::Duration::from_secs(0)));
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history: StateHistory<String> = StateHistory::new();
        history.record(StateTransition {
            from: None,
            to: Some("waiting".to_string()),
            cause: Cause::Init,
            timestamp: Utc::now(),
        });

        let json = serde_json::to_string(&history).unwrap();
        let deserialized: StateHistory<String> = serde_json::from_str(&json).unwrap();

        let restored = deserialized.last().unwrap();
        assert_eq!(deserialized.len(), 1);
        assert_eq!(restored.to, Some("waiting".to_string()));
        assert_eq!(restored.cause, Cause::Init);
    }

    #[test]
    fn entered_matches_target_label() {
        let t = transition(Some("a"), "b");
        assert!(t.entered("b"));
        assert!(!t.entered("a"));
    }
}
