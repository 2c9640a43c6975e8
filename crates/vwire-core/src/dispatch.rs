#![forbid(unsafe_code)]

//! Edge-triggered change dispatch.
//!
//! # Design
//!
//! [`Dispatcher`] is the core every observable node embeds: an edge flag, a
//! registry of weakly-held observers, and the notify loop. Nodes raise
//! changes through [`emit`](Dispatcher::emit); bare
//! [`mark_changed`](Dispatcher::mark_changed) /
//! [`notify`](Dispatcher::notify) exist for internal bookkeeping.
//!
//! # Invariants
//!
//! 1. `notify` is a no-op unless the edge flag is set.
//! 2. The flag is cleared *before* any observer runs, so a notify triggered
//!    during a callback for the same mark is suppressed. A fresh
//!    `mark_changed` during a callback is an independent change.
//! 3. Observers are dispatched from a snapshot: registry mutation during a
//!    callback never affects the in-flight cycle.
//! 4. Duplicate registration is a no-op; `count_observers` is exact (dead
//!    weak entries are pruned whenever the registry is touched).
//! 5. A failing observer never prevents delivery to the rest; failures are
//!    aggregated into the returned [`NotifyError`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{NotifyError, UpdateError};
use crate::observe::{Aspect, NodeId, Observer};

struct Entry {
    id: NodeId,
    observer: Weak<dyn Observer>,
}

/// Edge-triggered observable core: changed flag plus observer registry.
pub struct Dispatcher {
    id: NodeId,
    changed: Cell<bool>,
    observers: RefCell<Vec<Entry>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NodeId::next(),
            changed: Cell::new(false),
            observers: RefCell::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Register `observer` unless an entry with the same id is present.
    pub fn add_observer(&self, observer: &Rc<dyn Observer>) {
        let mut observers = self.observers.borrow_mut();
        observers.retain(|entry| entry.observer.strong_count() > 0);
        let id = observer.id();
        if observers.iter().any(|entry| entry.id == id) {
            return;
        }
        observers.push(Entry {
            id,
            observer: Rc::downgrade(observer),
        });
    }

    /// Remove the registration with the given id, if any.
    pub fn delete_observer(&self, observer: NodeId) {
        self.observers
            .borrow_mut()
            .retain(|entry| entry.id != observer && entry.observer.strong_count() > 0);
    }

    pub fn delete_all_observers(&self) {
        self.observers.borrow_mut().clear();
    }

    /// Exact number of live registrations.
    #[must_use]
    pub fn count_observers(&self) -> usize {
        let mut observers = self.observers.borrow_mut();
        observers.retain(|entry| entry.observer.strong_count() > 0);
        observers.len()
    }

    /// Arm the edge flag. No other side effect.
    pub fn mark_changed(&self) {
        self.changed.set(true);
    }

    pub fn clear_changed(&self) {
        self.changed.set(false);
    }

    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.changed.get()
    }

    /// Deliver `aspect` once to every currently-registered observer, if the
    /// edge flag is armed; otherwise do nothing.
    ///
    /// The flag is cleared first and the registry is snapshotted, so
    /// callbacks may freely add or remove observers or re-arm the flag.
    pub fn notify(&self, aspect: &Aspect) -> Result<(), NotifyError> {
        if !self.changed.get() {
            return Ok(());
        }
        self.changed.set(false);

        let snapshot: Vec<(NodeId, Rc<dyn Observer>)> = {
            let mut observers = self.observers.borrow_mut();
            observers.retain(|entry| entry.observer.strong_count() > 0);
            observers
                .iter()
                .filter_map(|entry| entry.observer.upgrade().map(|o| (entry.id, o)))
                .collect()
        };
        tracing::debug!(
            message = "dispatch.notify",
            node = ?self.id,
            aspect = %aspect,
            observers = snapshot.len()
        );

        let mut failures: Vec<(NodeId, UpdateError)> = Vec::new();
        for (id, observer) in snapshot {
            if let Err(error) = observer.update(self.id, aspect) {
                failures.push((id, error));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::new(failures))
        }
    }

    /// Mark changed and notify as one step. This is how production code
    /// raises a change; the pair runs to completion within the call, so no
    /// other mark can interleave with its notify.
    pub fn emit(&self, aspect: &Aspect) -> Result<(), NotifyError> {
        self.mark_changed();
        self.notify(aspect)
    }

    /// Drop all registrations. Safe to call repeatedly; never panics.
    pub fn teardown(&self) {
        self.delete_all_observers();
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("id", &self.id)
            .field("changed", &self.changed.get())
            .field("observers", &self.observers.borrow().len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
