#![forbid(unsafe_code)]

//! Value containers and the uniform value surface.
//!
//! [`Value<T>`] holds a single payload and raises [`Aspect::VALUE`] on every
//! externally visible mutation. [`ValueModel`] is the one get/set surface
//! collaborators use regardless of what backs it: a plain container, a
//! property adapter, or a buffered cache.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::dispatch::Dispatcher;
use crate::error::{NotifyError, UpdateResult, WireError};
use crate::observe::{Aspect, NodeId, Observable, Observer};

/// Uniform read/write surface over any value-bearing node.
///
/// `get_value` returns `None` when no backing subject is reachable; plain
/// containers always return `Some`.
pub trait ValueModel<T> {
    fn get_value(&self) -> Option<T>;
    fn set_value(&self, value: T) -> crate::error::Result<()>;
}

/// A value-bearing node: observable and readable/writable through the same
/// handle. This is the capability adapters and caches both consume and
/// expose.
pub trait ValueNode<T>: Observable + ValueModel<T> {}

impl<T, N: Observable + ValueModel<T>> ValueNode<T> for N {}

struct ValueInner<T> {
    node: Dispatcher,
    value: RefCell<T>,
}

// A container terminates a chain: it accepts updates and ignores them.
impl<T: 'static> Observer for ValueInner<T> {
    fn id(&self) -> NodeId {
        self.node.id()
    }

    fn update(&self, _sender: NodeId, _aspect: &Aspect) -> UpdateResult {
        Ok(())
    }
}

/// Single-payload value container.
///
/// Cloning the handle shares the same boxed value and observer registry.
/// `set` raises exactly one notify cycle with [`Aspect::VALUE`];
/// `set_silently` mutates without notifying.
pub struct Value<T> {
    inner: Rc<ValueInner<T>>,
}

impl<T> Clone for Value<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Value<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ValueInner {
                node: Dispatcher::new(),
                value: RefCell::new(value),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.node.id()
    }

    /// Current payload, by clone.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Access the payload by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.borrow())
    }

    /// Store `value` and raise one change cycle with [`Aspect::VALUE`].
    pub fn set(&self, value: T) -> Result<(), NotifyError> {
        self.set_silently(value);
        self.inner.node.emit(&Aspect::VALUE)
    }

    /// Store `value` with no notification.
    pub fn set_silently(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
    }

    /// This container as a registrable observer (it ignores updates).
    #[must_use]
    pub fn as_observer(&self) -> Rc<dyn Observer> {
        self.inner.clone()
    }
}

impl<T: Clone + 'static> Observable for Value<T> {
    fn id(&self) -> NodeId {
        self.inner.node.id()
    }

    fn add_observer(&self, observer: &Rc<dyn Observer>) {
        self.inner.node.add_observer(observer);
    }

    fn delete_observer(&self, observer: NodeId) {
        self.inner.node.delete_observer(observer);
    }

    fn delete_all_observers(&self) {
        self.inner.node.delete_all_observers();
    }

    fn count_observers(&self) -> usize {
        self.inner.node.count_observers()
    }

    fn has_changed(&self) -> bool {
        self.inner.node.has_changed()
    }

    fn teardown(&self) {
        self.inner.node.teardown();
    }
}

impl<T: Clone + 'static> ValueModel<T> for Value<T> {
    fn get_value(&self) -> Option<T> {
        Some(self.get())
    }

    fn set_value(&self, value: T) -> crate::error::Result<()> {
        self.set(value).map_err(WireError::from)
    }
}

impl<T: fmt::Debug> fmt::Debug for Value<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("id", &self.inner.node.id())
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
