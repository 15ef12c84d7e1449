//! Builder for constructing machines.

use crate::builder::error::BuildError;
use crate::config::FlopConfig;
use crate::core::{Derivation, Label};
use crate::machine::{ActionHandler, EntryCallback, Machine};

/// Builder for constructing machines with a fluent API.
///
/// # Example
///
/// ```rust
/// use flipflop::builder::MachineBuilder;
///
/// let machine = MachineBuilder::<u32, &'static str>::new()
///     .name("threshold")
///     .derive(|n: &u32| if *n >= 10 { "high" } else { "low" })
///     .bind("add", |n: &mut u32, _: ()| *n += 5)
///     .initial(8)
///     .build()
///     .unwrap();
///
/// assert_eq!(machine.current_label(), Some(&"low"));
/// ```
pub struct MachineBuilder<B, L: Label, P = ()> {
    name: Option<String>,
    actions: Vec<(String, ActionHandler<B, P>)>,
    entries: Vec<(L, EntryCallback<B>)>,
    derivation: Option<Derivation<B, L>>,
    initial: Option<B>,
    config: FlopConfig,
}

impl<B, L: Label, P> MachineBuilder<B, L, P> {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            name: None,
            actions: Vec::new(),
            entries: Vec::new(),
            derivation: None,
            initial: None,
            config: FlopConfig::default(),
        }
    }

    /// Set the machine name (required).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Bind an action handler. Later bindings of the same name win.
    pub fn bind<F>(mut self, action: impl Into<String>, handler: F) -> Self
    where
        F: FnMut(&mut B, P) + Send + 'static,
    {
        self.actions.push((action.into(), Box::new(handler)));
        self
    }

    /// Register an entry callback. Later registrations for a label win.
    pub fn on<F>(mut self, label: impl Into<L>, callback: F) -> Self
    where
        F: FnMut(&B) + Send + 'static,
    {
        self.entries.push((label.into(), Box::new(callback)));
        self
    }

    /// Set the derivation.
    pub fn derive<F, R>(mut self, derive: F) -> Self
    where
        F: Fn(&B) -> R + Send + Sync + 'static,
        R: Into<Option<L>>,
    {
        self.derivation = Some(Derivation::new(derive));
        self
    }

    /// Initialize the machine with `data` once it is built.
    ///
    /// Entry callbacks registered on the builder fire during `build`.
    pub fn initial(mut self, data: B) -> Self {
        self.initial = Some(data);
        self
    }

    /// Start with the gate closed.
    pub fn reject_events(mut self) -> Self {
        self.config.accept_events = false;
        self
    }

    /// Bound the machine's history. Zero disables it.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Replace the whole config.
    pub fn config(mut self, config: FlopConfig) -> Self {
        self.config = config;
        self
    }
}

impl<B: Default, L: Label, P> MachineBuilder<B, L, P> {
    /// Build the machine.
    /// Returns an error if the name is missing or blank.
    pub fn build(self) -> Result<Machine<B, L, P>, BuildError> {
        let name = self.name.ok_or(BuildError::MissingName)?;
        if name.trim().is_empty() {
            return Err(BuildError::EmptyName);
        }

        let mut machine = Machine::with_config(name, &self.config);
        for (action, handler) in self.actions {
            machine.insert_action(action, handler);
        }
        for (label, callback) in self.entries {
            machine.insert_entry(label, callback);
        }
        if let Some(derivation) = self.derivation {
            machine.set_derivation(derivation);
        }
        if let Some(data) = self.initial {
            machine.init(data);
        }

        Ok(machine)
    }
}

impl<B, L: Label, P> Default for MachineBuilder<B, L, P> {
    fn default() -> Self {
        Self::new()
    }
}
