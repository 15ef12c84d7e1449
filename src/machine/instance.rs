//! The single-threaded machine core.

use crate::config::FlopConfig;
use crate::core::{Cause, Derivation, Label, StateHistory, StateTransition};
use crate::machine::step::{FlopError, Step};
use chrono::Utc;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error, trace};

/// Handler bound to an action name. Mutates the bag in place.
pub type ActionHandler<B, P> = Box<dyn FnMut(&mut B, P) + Send>;

/// Callback fired when the machine enters a label.
pub type EntryCallback<B> = Box<dyn FnMut(&B) + Send>;

/// A named state machine whose label is derived from its state bag.
///
/// Actions mutate the bag, the derivation maps the bag to a label, and the
/// entry callback for a label fires each time the derived label changes to
/// it. Every configuration and mutation method returns `&mut Self` so calls
/// chain.
///
/// # Example
///
/// ```rust
/// use flipflop::Machine;
///
/// #[derive(Default)]
/// struct Counter {
///     count: u32,
/// }
///
/// let mut machine: Machine<Counter, &'static str> = Machine::new("counter");
/// machine
///     .derive(|c: &Counter| if c.count >= 3 { "ready" } else { "waiting" })
///     .bind("increment", |c: &mut Counter, _: ()| c.count += 1)
///     .init(Counter { count: 0 });
///
/// assert_eq!(machine.current_label(), Some(&"waiting"));
///
/// machine
///     .trigger("increment", ())
///     .trigger("increment", ())
///     .trigger("increment", ());
///
/// assert_eq!(machine.current_label(), Some(&"ready"));
/// assert_eq!(machine.state().count, 3);
/// ```
pub struct Machine<B, L: Label, P = ()> {
    name: String,
    actions: HashMap<String, ActionHandler<B, P>>,
    entries: HashMap<L, EntryCallback<B>>,
    derivation: Derivation<B, L>,
    accepting: bool,
    bag: B,
    current: Option<L>,
    history: StateHistory<L>,
}

impl<B: Default, L: Label, P> Machine<B, L, P> {
    /// Create a machine with default settings: open gate, empty bag,
    /// sentinel label, and a derivation that always yields the sentinel.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &FlopConfig::default())
    }

    /// Create a machine using `config` for its gate and history bound.
    pub fn with_config(name: impl Into<String>, config: &FlopConfig) -> Self {
        Self {
            name: name.into(),
            actions: HashMap::new(),
            entries: HashMap::new(),
            derivation: Derivation::unset(),
            accepting: config.accept_events,
            bag: B::default(),
            current: None,
            history: StateHistory::with_limit(config.history_limit),
        }
    }

    /// `init` with an empty bag.
    pub fn init_default(&mut self) -> &mut Self {
        self.init(B::default())
    }
}

impl<B, L: Label, P> Machine<B, L, P> {
    /// Register the handler for `action`, replacing any previous one.
    pub fn bind<F>(&mut self, action: impl Into<String>, handler: F) -> &mut Self
    where
        F: FnMut(&mut B, P) + Send + 'static,
    {
        self.insert_action(action.into(), Box::new(handler));
        self
    }

    /// Register the entry callback for `label`, replacing any previous one.
    pub fn on<F>(&mut self, label: impl Into<L>, callback: F) -> &mut Self
    where
        F: FnMut(&B) + Send + 'static,
    {
        self.insert_entry(label.into(), Box::new(callback));
        self
    }

    /// Set the derivation computing the label from the bag.
    ///
    /// `derive` must be deterministic and must not mutate through the bag.
    /// It may return a label or an `Option` of one; `None` is the sentinel.
    pub fn derive<F, R>(&mut self, derive: F) -> &mut Self
    where
        F: Fn(&B) -> R + Send + Sync + 'static,
        R: Into<Option<L>>,
    {
        self.derivation = Derivation::new(derive);
        self
    }

    pub fn accept_events(&mut self) -> &mut Self {
        self.accepting = true;
        self
    }

    pub fn reject_events(&mut self) -> &mut Self {
        self.accepting = false;
        self
    }

    /// Replace the bag with `data` and re-derive the label.
    ///
    /// If the label changed, the entry callback for the new label fires.
    /// On a fresh machine this always counts as a change unless the
    /// derivation yields the sentinel.
    pub fn init(&mut self, data: B) -> &mut Self {
        if let Err(err) = self.try_init(data) {
            trace!(machine = %self.name, error = %err, "init absorbed error");
        }
        self
    }

    /// Strict form of [`init`](Self::init).
    ///
    /// Fails only when the derivation panics, in which case the bag holds
    /// `data` but the label keeps its previous value.
    pub fn try_init(&mut self, data: B) -> Result<Step<L>, FlopError> {
        self.bag = data;
        self.settle(Cause::Init)
    }

    /// Run the handler bound to `action` with `payload`, then re-derive.
    ///
    /// A closed gate or an unbound action is a silent no-op.
    pub fn trigger(&mut self, action: &str, payload: P) -> &mut Self {
        if let Err(err) = self.try_trigger(action, payload) {
            trace!(machine = %self.name, error = %err, "trigger absorbed error");
        }
        self
    }

    /// Strict form of [`trigger`](Self::trigger).
    ///
    /// Reports a closed gate or an unbound action instead of ignoring it.
    /// Neither case touches the bag or the label.
    pub fn try_trigger(&mut self, action: &str, payload: P) -> Result<Step<L>, FlopError> {
        if !self.accepting {
            return Err(FlopError::Rejected {
                machine: self.name.clone(),
                action: action.to_string(),
            });
        }

        let Some(handler) = self.actions.get_mut(action) else {
            return Err(FlopError::UnknownAction {
                machine: self.name.clone(),
                action: action.to_string(),
            });
        };

        handler(&mut self.bag, payload);
        self.settle(Cause::Action(action.to_string()))
    }

    /// Re-derive the label and fire the entry callback if it changed.
    fn settle(&mut self, cause: Cause) -> Result<Step<L>, FlopError> {
        let derived = catch_unwind(AssertUnwindSafe(|| self.derivation.derive(&self.bag)));
        let next = match derived {
            Ok(next) => next,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(
                    machine = %self.name,
                    panic = %message,
                    "derivation panicked, keeping current label"
                );
                return Err(FlopError::DerivationPanicked {
                    machine: self.name.clone(),
                    message,
                });
            }
        };

        if next == self.current {
            trace!(machine = %self.name, label = label_name(&next), "label unchanged");
            return Ok(Step::Unchanged);
        }

        let from = std::mem::replace(&mut self.current, next.clone());
        self.history.record(StateTransition {
            from: from.clone(),
            to: next.clone(),
            cause,
            timestamp: Utc::now(),
        });

        let callback = match next.as_ref() {
            Some(label) => self.entries.get_mut(label),
            None => None,
        };
        let entered = match callback {
            Some(callback) => {
                callback(&self.bag);
                true
            }
            None => false,
        };

        debug!(
            machine = %self.name,
            from = label_name(&from),
            to = label_name(&next),
            entered,
            "label changed"
        );

        Ok(Step::Transitioned {
            from,
            to: next,
            entered,
        })
    }

    pub(crate) fn insert_action(&mut self, action: String, handler: ActionHandler<B, P>) {
        self.actions.insert(action, handler);
    }

    pub(crate) fn insert_entry(&mut self, label: L, callback: EntryCallback<B>) {
        self.entries.insert(label, callback);
    }

    pub(crate) fn set_derivation(&mut self, derivation: Derivation<B, L>) {
        self.derivation = derivation;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The label computed by the last completed `init`/`trigger`.
    ///
    /// `None` before the first `init`, or whenever the derivation yielded
    /// the sentinel.
    pub fn current_label(&self) -> Option<&L> {
        self.current.as_ref()
    }

    /// Read-only view of the state bag.
    pub fn state(&self) -> &B {
        &self.bag
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub fn is_bound(&self, action: &str) -> bool {
        self.actions.contains_key(action)
    }

    pub fn has_entry(&self, label: &L) -> bool {
        self.entries.contains_key(label)
    }

    /// Whether the current label reports itself as final.
    ///
    /// Informational only; a final label does not stop triggers.
    pub fn is_final(&self) -> bool {
        self.current.as_ref().is_some_and(Label::is_final)
    }

    pub fn history(&self) -> &StateHistory<L> {
        &self.history
    }
}

impl<B, L: Label, P> fmt::Debug for Machine<B, L, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.name)
            .field("current", &self.current)
            .field("accepting", &self.accepting)
            .field("actions", &self.actions.len())
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

fn label_name<L: Label>(label: &Option<L>) -> &str {
    label.as_ref().map_or("<unset>", Label::name)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
