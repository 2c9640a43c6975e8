#![forbid(unsafe_code)]

//! Observable domain state.
//!
//! [`Model<S>`] carries a piece of domain state together with an
//! edge-triggered dispatcher, the way a domain class in this design raises
//! named aspect changes from its own setters: mutate the state, then
//! [`raise`](Model::raise) the aspect that changed. Property adapters bind
//! to models and translate those aspect notifications onto the value
//! surface.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::dispatch::Dispatcher;
use crate::error::NotifyError;
use crate::observe::{Aspect, NodeId, Observable, Observer};

struct ModelInner<S> {
    node: Dispatcher,
    state: RefCell<S>,
}

/// A domain object wired into the propagation graph.
///
/// Cloning the handle shares the same state and observer registry.
pub struct Model<S> {
    inner: Rc<ModelInner<S>>,
}

impl<S> Clone for Model<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: 'static> Model<S> {
    #[must_use]
    pub fn new(state: S) -> Self {
        Self {
            inner: Rc::new(ModelInner {
                node: Dispatcher::new(),
                state: RefCell::new(state),
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.node.id()
    }

    /// Read access to the state.
    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&*self.inner.state.borrow())
    }

    /// Mutable access with no notification. The borrow ends before this
    /// returns, so a following [`raise`](Model::raise) may re-enter freely.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut *self.inner.state.borrow_mut())
    }

    /// Announce that `aspect` changed, notifying all registered observers.
    pub fn raise(&self, aspect: &Aspect) -> Result<(), NotifyError> {
        self.inner.node.emit(aspect)
    }

    /// Mutate the state and raise `aspect`, the domain-setter idiom.
    pub fn mutate(&self, aspect: &Aspect, f: impl FnOnce(&mut S)) -> Result<(), NotifyError> {
        self.with_mut(f);
        self.raise(aspect)
    }
}

impl<S: 'static> Observable for Model<S> {
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

impl<S: fmt::Debug> fmt::Debug for Model<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.inner.node.id())
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
