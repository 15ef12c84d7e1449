//! Name-keyed registry of machines.
//!
//! A registry hands out exactly one machine per name for its whole
//! lifetime. Lookups of an unknown name create the machine on the spot;
//! entries are never evicted except by an explicit [`Registry::clear`].

use crate::config::FlopConfig;
use crate::core::Label;
use crate::machine::{Flop, Machine};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

pub mod error;
mod process;

pub use error::RegistryError;
pub use process::{global, machine, JsonBag, JsonFlop, JsonRegistry};

/// Mapping from machine name to its single instance.
///
/// # Example
///
/// ```rust
/// use flipflop::Registry;
///
/// let registry: Registry<u32, &'static str> = Registry::new();
///
/// let first = registry.machine("door");
/// let second = registry.machine("door");
/// assert!(first.ptr_eq(&second));
/// ```
pub struct Registry<B, L: Label, P = ()> {
    machines: Mutex<HashMap<String, Flop<B, L, P>>>,
    config: FlopConfig,
}

impl<B, L: Label, P> Registry<B, L, P> {
    /// Create an empty registry whose machines use the default config.
    pub fn new() -> Self {
        Self::with_config(FlopConfig::default())
    }

    /// Create an empty registry whose machines use `config`.
    pub fn with_config(config: FlopConfig) -> Self {
        Self {
            machines: Mutex::new(HashMap::new()),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Flop<B, L, P>>> {
        match self.machines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("registry lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    pub fn config(&self) -> &FlopConfig {
        &self.config
    }

    /// Get the machine registered as `name`, if any, without creating it.
    pub fn get(&self, name: &str) -> Option<Flop<B, L, P>> {
        self.lock().get(name).cloned()
    }

    /// Register a machine built elsewhere, typically by `MachineBuilder`.
    ///
    /// Fails if a machine with the same name already exists, so the
    /// one-instance-per-name rule holds.
    pub fn register(&self, machine: Machine<B, L, P>) -> Result<Flop<B, L, P>, RegistryError> {
        let mut machines = self.lock();
        if machines.contains_key(machine.name()) {
            return Err(RegistryError::AlreadyRegistered {
                name: machine.name().to_string(),
            });
        }

        let name = machine.name().to_string();
        debug!(machine = %name, "registering machine");
        let flop = Flop::new(machine);
        machines.insert(name, flop.clone());
        Ok(flop)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Names of every registered machine, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// Forget every machine.
    ///
    /// Handles already handed out keep working but are no longer reachable
    /// by name; the next lookup of a name creates a fresh machine.
    pub fn clear(&self) {
        let mut machines = self.lock();
        debug!(count = machines.len(), "clearing registry");
        machines.clear();
    }
}

impl<B: Default, L: Label, P> Registry<B, L, P> {
    /// Get the machine named `name`, creating it if this is the first lookup.
    ///
    /// New machines start with an empty bag, no actions, no entry
    /// callbacks, a derivation yielding the sentinel, and the gate and
    /// history bound from the registry's config.
    pub fn machine(&self, name: &str) -> Flop<B, L, P> {
        let mut machines = self.lock();
        if let Some(flop) = machines.get(name) {
            return flop.clone();
        }

        debug!(machine = name, "creating machine");
        let flop = Flop::new(Machine::with_config(name, &self.config));
        machines.insert(name.to_string(), flop.clone());
        flop
    }
}

impl<B, L: Label, P> Default for Registry<B, L, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, L: Label, P> fmt::Debug for Registry<B, L, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("machines", &self.names())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[derive(Default, Clone, Debug, PartialEq)]
    struct Bag {
        hits: u32,
    }

    #[test]
    fn same_name_returns_same_machine() {
        let registry: Registry<Bag, &'static str> = Registry::new();

        let a = registry.machine("m");
        let b = registry.machine("m");

        assert!(a.ptr_eq(&b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn configuration_is_visible_through_every_lookup() {
        let registry: Registry<Bag, &'static str> = Registry::new();

        registry
            .machine("m")
            .bind("hit", |b: &mut Bag, _: ()| b.hits += 1)
            .derive(|b: &Bag| if b.hits > 0 { "hit" } else { "clean" });
        registry.machine("m").init_default().trigger("hit", ());

        let m = registry.machine("m");
        assert_eq!(m.state().hits, 1);
        assert_eq!(m.current_label(), Some("hit"));
    }

    #[test]
    fn different_names_get_independent_machines() {
        let registry: Registry<Bag, &'static str> = Registry::new();

        let a = registry.machine("a");
        let b = registry.machine("b");
        a.bind("hit", |b: &mut Bag, _: ()| b.hits += 1).trigger("hit", ());

        assert!(!a.ptr_eq(&b));
        assert!(!b.is_bound("hit"));
        assert_eq!(b.state(), Bag::default());
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn get_does_not_create() {
        let registry: Registry<Bag, &'static str> = Registry::new();

        assert!(registry.get("ghost").is_none());
        assert!(!registry.contains("ghost"));
        assert!(registry.is_empty());
    }

    #[test]
    fn register_rejects_taken_names() {
        let registry: Registry<Bag, &'static str> = Registry::new();
        registry.machine("taken");

        let result = registry.register(Machine::new("taken"));

        assert!(matches!(
            result,
            Err(RegistryError::AlreadyRegistered { ref name }) if name == "taken"
        ));
    }

    #[test]
    fn registered_machine_is_found_by_name() {
        let registry: Registry<Bag, &'static str> = Registry::new();
        let mut machine: Machine<Bag, &'static str> = Machine::new("prebuilt");
        machine.bind("hit", |b: &mut Bag, _: ()| b.hits += 1);

        let flop = registry.register(machine).unwrap();

        assert!(registry.machine("prebuilt").ptr_eq(&flop));
        assert!(flop.is_bound("hit"));
    }

    #[test]
    fn clear_forgets_machines() {
        let registry: Registry<Bag, &'static str> = Registry::new();
        let old = registry.machine("m");

        registry.clear();
        let new = registry.machine("m");

        assert!(!old.ptr_eq(&new));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_config_applies_to_new_machines() {
        let registry: Registry<Bag, &'static str> =
            Registry::with_config(FlopConfig::default().accept_events(false));

        let m = registry.machine("closed");

        assert!(!m.is_accepting());
        assert!(!registry.config().accept_events);
    }

    #[test]
    fn concurrent_first_lookup_creates_one_machine() {
        let registry: Arc<Registry<Bag, &'static str>> = Arc::new(Registry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.machine("race"))
            })
            .collect();
        let flops: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(registry.len(), 1);
        assert!(flops.iter().all(|f| f.ptr_eq(&flops[0])));
    }
}
