//! Shared handle to a machine.

use crate::core::{Derivation, Label, StateHistory};
use crate::machine::instance::Machine;
use crate::machine::step::{FlopError, Step};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use tracing::{debug, warn};

/// A mutation issued from inside the machine's own step, applied once that
/// step settles.
type Deferred<B, L, P> = Box<dyn FnOnce(&mut Machine<B, L, P>) + Send>;

struct Shared<B, L: Label, P> {
    name: String,
    machine: Mutex<Machine<B, L, P>>,
    /// Thread currently running a step, if any.
    owner: Mutex<Option<ThreadId>>,
    deferred: Mutex<VecDeque<Deferred<B, L, P>>>,
}

/// Marks the calling thread as the owner of a machine until dropped.
struct Claim<'a> {
    owner: &'a Mutex<Option<ThreadId>>,
}

impl<'a> Claim<'a> {
    fn new(owner: &'a Mutex<Option<ThreadId>>) -> Self {
        *owner.lock().unwrap_or_else(PoisonError::into_inner) = Some(thread::current().id());
        Self { owner }
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        *self.owner.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// Cloneable handle to a [`Machine`], as handed out by a registry.
///
/// Clones refer to the same machine. Each method takes the machine's lock
/// once, so an `init` or `trigger` (handler, re-derivation, entry callback)
/// is observed atomically by other threads.
///
/// Handlers, derivations and callbacks run while the lock is held. When one
/// of them calls back into its own machine, mutations (`trigger`, `init`,
/// `bind` and the rest of the chainable calls) are queued and applied in
/// order right after the current step settles, still under the same lock.
/// The strict `try_init`/`try_trigger` report [`FlopError::Reentrant`]
/// instead.
///
/// # Panics
///
/// Reading the machine (`current_label`, `state`, `history`, `read`,
/// `with`, ...) from inside its own handler, derivation or callback panics,
/// like a second borrow of a `RefCell`. The callback already receives the
/// bag, and the label it was registered for is the current one.
///
/// # Example
///
/// ```rust
/// use flipflop::{Flop, Machine};
///
/// let flop: Flop<u32, &'static str> = Flop::new(Machine::new("parity"));
/// flop.derive(|n: &u32| if n % 2 == 0 { "even" } else { "odd" })
///     .bind("add", |n: &mut u32, _: ()| *n += 1)
///     .init(0)
///     .trigger("add", ());
///
/// assert_eq!(flop.current_label(), Some("odd"));
/// ```
pub struct Flop<B, L: Label, P = ()> {
    shared: Arc<Shared<B, L, P>>,
}

impl<B, L: Label, P> Clone for Flop<B, L, P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<B, L: Label, P> Flop<B, L, P> {
    pub fn new(machine: Machine<B, L, P>) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: machine.name().to_string(),
                machine: Mutex::new(machine),
                owner: Mutex::new(None),
                deferred: Mutex::new(VecDeque::new()),
            }),
        }
    }

    /// Lock the machine, recovering it if a handler or callback panicked
    /// while it was held.
    fn lock(&self) -> MutexGuard<'_, Machine<B, L, P>> {
        match self.shared.machine.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(machine = %self.shared.name, "machine lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn held_here(&self) -> bool {
        let owner = self.shared.owner.lock().unwrap_or_else(PoisonError::into_inner);
        *owner == Some(thread::current().id())
    }

    fn next_deferred(&self) -> Option<Deferred<B, L, P>> {
        self.shared
            .deferred
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Run `op` on the locked machine, then apply whatever it deferred.
    ///
    /// Returns `None` without touching the machine when this thread is
    /// already inside one of the machine's steps.
    fn run<R>(&self, op: impl FnOnce(&mut Machine<B, L, P>) -> R) -> Option<R> {
        if self.held_here() {
            return None;
        }

        let mut machine = self.lock();
        let _claim = Claim::new(&self.shared.owner);
        let result = op(&mut *machine);
        while let Some(deferred) = self.next_deferred() {
            deferred(&mut *machine);
        }
        Some(result)
    }

    fn inspect<R>(&self, op: impl FnOnce(&mut Machine<B, L, P>) -> R) -> R {
        match self.run(op) {
            Some(result) => result,
            None => panic!(
                "machine '{}' read from inside its own step; use the bag passed to the handler or callback",
                self.shared.name
            ),
        }
    }

    fn reentrant(&self) -> FlopError {
        FlopError::Reentrant {
            machine: self.shared.name.clone(),
        }
    }

    /// Whether both handles refer to the same machine.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn try_init(&self, data: B) -> Result<Step<L>, FlopError> {
        self.run(|machine| machine.try_init(data))
            .unwrap_or_else(|| Err(self.reentrant()))
    }

    pub fn try_trigger(&self, action: &str, payload: P) -> Result<Step<L>, FlopError> {
        self.run(|machine| machine.try_trigger(action, payload))
            .unwrap_or_else(|| Err(self.reentrant()))
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn current_label(&self) -> Option<L> {
        self.inspect(|machine| machine.current_label().cloned())
    }

    /// Run `f` against the state bag while holding the lock.
    pub fn read<R>(&self, f: impl FnOnce(&B) -> R) -> R {
        self.inspect(|machine| f(machine.state()))
    }

    /// Run `f` against the whole machine while holding the lock.
    pub fn with<R>(&self, f: impl FnOnce(&mut Machine<B, L, P>) -> R) -> R {
        self.inspect(f)
    }

    pub fn is_accepting(&self) -> bool {
        self.inspect(|machine| machine.is_accepting())
    }

    pub fn is_bound(&self, action: &str) -> bool {
        self.inspect(|machine| machine.is_bound(action))
    }

    pub fn has_entry(&self, label: &L) -> bool {
        self.inspect(|machine| machine.has_entry(label))
    }

    pub fn is_final(&self) -> bool {
        self.inspect(|machine| machine.is_final())
    }

    /// Snapshot of the machine's transition history.
    pub fn history(&self) -> StateHistory<L> {
        self.inspect(|machine| machine.history().clone())
    }
}

impl<B: Send + 'static, L: Label, P: Send + 'static> Flop<B, L, P> {
    /// Apply `op` now, or after the current step when called from inside it.
    fn apply<F>(&self, op: F)
    where
        F: FnOnce(&mut Machine<B, L, P>) + Send + 'static,
    {
        if self.held_here() {
            debug!(machine = %self.shared.name, "re-entrant call deferred until the current step settles");
            self.shared
                .deferred
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(Box::new(op));
            return;
        }

        self.run(op);
    }

    pub fn bind<F>(&self, action: impl Into<String>, handler: F) -> &Self
    where
        F: FnMut(&mut B, P) + Send + 'static,
    {
        let action = action.into();
        let handler = Box::new(handler);
        self.apply(move |machine| machine.insert_action(action, handler));
        self
    }

    pub fn on<F>(&self, label: impl Into<L>, callback: F) -> &Self
    where
        F: FnMut(&B) + Send + 'static,
    {
        let label = label.into();
        let callback = Box::new(callback);
        self.apply(move |machine| machine.insert_entry(label, callback));
        self
    }

    pub fn derive<F, R>(&self, derive: F) -> &Self
    where
        F: Fn(&B) -> R + Send + Sync + 'static,
        R: Into<Option<L>>,
    {
        let derivation = Derivation::new(derive);
        self.apply(move |machine| machine.set_derivation(derivation));
        self
    }

    pub fn accept_events(&self) -> &Self {
        self.apply(|machine| {
            machine.accept_events();
        });
        self
    }

    pub fn reject_events(&self) -> &Self {
        self.apply(|machine| {
            machine.reject_events();
        });
        self
    }

    pub fn init(&self, data: B) -> &Self {
        self.apply(move |machine| {
            machine.init(data);
        });
        self
    }

    pub fn trigger(&self, action: &str, payload: P) -> &Self {
        let action = action.to_string();
        self.apply(move |machine| {
            machine.trigger(&action, payload);
        });
        self
    }
}

impl<B: Default + Send + 'static, L: Label, P: Send + 'static> Flop<B, L, P> {
    /// `init` with an empty bag.
    pub fn init_default(&self) -> &Self {
        self.apply(|machine| {
            machine.init_default();
        });
        self
    }
}

impl<B: Clone, L: Label, P> Flop<B, L, P> {
    /// Copy of the state bag.
    pub fn state(&self) -> B {
        self.inspect(|machine| machine.state().clone())
    }
}

impl<B, L: Label, P> fmt::Debug for Flop<B, L, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shared.machine.try_lock() {
            Ok(machine) => f.debug_tuple("Flop").field(&*machine).finish(),
            Err(_) => write!(f, "Flop({:?}, <locked>)", self.shared.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn counter(name: &str) -> Flop<u64, &'static str> {
        let flop: Flop<u64, &'static str> = Flop::new(Machine::new(name));
        flop.derive(|n: &u64| if *n >= 100 { "full" } else { "filling" })
            .bind("increment", |n: &mut u64, _: ()| *n += 1);
        flop
    }

    #[test]
    fn clones_share_one_machine() {
        let a = counter("shared");
        let b = a.clone();

        a.init(0);
        b.trigger("increment", ());

        assert!(a.ptr_eq(&b));
        assert_eq!(a.state(), 1);
        assert_eq!(b.current_label(), Some("filling"));
    }

    #[test]
    fn separate_handles_are_distinct() {
        let a = counter("a");
        let b = counter("b");

        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn concurrent_triggers_fire_entry_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let flop = counter("concurrent");
        let seen = Arc::clone(&hits);
        flop.on("full", move |n: &u64| {
            assert_eq!(*n, 100);
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .init(0);

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let flop = flop.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        flop.trigger("increment", ());
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(flop.state(), 200);
        assert_eq!(flop.current_label(), Some("full"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let flop = counter("poisoned");
        flop.bind("explode", |_: &mut u64, _: ()| panic!("handler failed"))
            .init(0);

        let clone = flop.clone();
        let result = thread::spawn(move || {
            clone.trigger("explode", ());
        })
        .join();
        assert!(result.is_err());

        flop.trigger("increment", ());
        assert_eq!(flop.state(), 1);
    }

    #[test]
    fn read_and_with_expose_machine() {
        let flop = counter("inspect");
        flop.init(41).trigger("increment", ());

        assert_eq!(flop.read(|n| *n * 2), 84);
        assert_eq!(flop.with(|m| m.history().len()), 1);
        assert_eq!(flop.name(), "inspect");
        assert!(flop.is_bound("increment"));
        assert!(!flop.has_entry(&"full"));
    }

    fn cycling_light(name: &str) -> Flop<u8, &'static str> {
        let flop: Flop<u8, &'static str> = Flop::new(Machine::new(name));
        flop.derive(|n: &u8| match n % 3 {
            0 => "red",
            1 => "green",
            _ => "yellow",
        })
        .bind("next", |n: &mut u8, _: ()| *n += 1);
        flop
    }

    #[test]
    fn reentrant_trigger_runs_after_the_current_step() {
        let flop = cycling_light("auto-advance");
        let me = flop.clone();
        flop.on("green", move |_: &u8| {
            me.trigger("next", ());
        })
        .init(0)
        .trigger("next", ());

        assert_eq!(flop.state(), 2);
        assert_eq!(flop.current_label(), Some("yellow"));
        assert_eq!(
            flop.history().get_path(),
            vec![Some(&"red"), Some(&"green"), Some(&"yellow")]
        );
    }

    #[test]
    fn reentrant_configuration_applies_in_order() {
        let flop = cycling_light("reconfigure");
        let me = flop.clone();
        flop.on("green", move |_: &u8| {
            me.reject_events().trigger("next", ());
        })
        .init(0)
        .trigger("next", ());

        assert_eq!(flop.state(), 1);
        assert_eq!(flop.current_label(), Some("green"));
        assert!(!flop.is_accepting());
    }

    #[test]
    fn reentrant_strict_call_is_reported() {
        let flop = cycling_light("strict-reentry");
        let me = flop.clone();
        let seen = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&seen);
        flop.on("green", move |_: &u8| {
            *slot.lock().unwrap() = Some(me.try_trigger("next", ()));
        })
        .init(0)
        .trigger("next", ());

        assert_eq!(
            *seen.lock().unwrap(),
            Some(Err(FlopError::Reentrant {
                machine: "strict-reentry".to_string()
            }))
        );
        assert_eq!(flop.current_label(), Some("green"));
    }

    #[test]
    fn reentrant_read_panics_instead_of_hanging() {
        let flop = cycling_light("read-reentry");
        let me = flop.clone();
        flop.on("green", move |_: &u8| {
            me.current_label();
        })
        .init(0);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            flop.trigger("next", ());
        }));
        assert!(result.is_err());

        assert_eq!(flop.name(), "read-reentry");
        assert_eq!(flop.current_label(), Some("green"));
        flop.trigger("next", ());
        assert_eq!(flop.current_label(), Some("yellow"));
    }
}
