#![forbid(unsafe_code)]

//! Adapter base: subject indirection and lazy subject hookup.
//!
//! # Design
//!
//! [`SubjectLink`] is the state every adapter composes: the adapted subject,
//! an optional shared indirection channel, and the flag recording whether
//! the subject emits updates. The composing node passes in a weak handle to
//! itself as an observer; the link registers and unregisters that handle
//! with the subject and the channel on the node's behalf.
//!
//! # Invariants
//!
//! 1. The owning adapter is subscribed to its subject **iff**
//!    `subject_emits_updates` is set and a subject is present. The
//!    adapter's own observer count plays no part here.
//! 2. With a channel configured, subject swaps route through the channel so
//!    every adapter sharing it follows in lockstep; the local store only
//!    changes from the channel's notification.
//! 3. Re-deriving the subject from the channel takes the local-store path.
//!    Routing it back through the channel would notify forever.
//! 4. Every local subject swap ends in a `value` change, even when the
//!    effective subject is unchanged (deliberate force-refresh).

use std::cell::{Cell, RefCell};
use std::rc::Weak;

use vwire_core::dispatch::Dispatcher;
use vwire_core::error::NotifyError;
use vwire_core::model::Model;
use vwire_core::observe::{Aspect, NodeId, Observable, Observer};
use vwire_core::value::Value;

/// Indirection channel: a value container holding the current subject, so
/// several adapters observing the same channel swap subjects in lockstep.
pub type SubjectChannel<S> = Value<Option<Model<S>>>;

/// Subject plumbing composed by adapter nodes.
pub struct SubjectLink<S> {
    node: Dispatcher,
    subject: RefCell<Option<Model<S>>>,
    channel: RefCell<Option<SubjectChannel<S>>>,
    emits_updates: Cell<bool>,
    observer: Weak<dyn Observer>,
}

impl<S: 'static> SubjectLink<S> {
    /// `observer` is the composing node, registered with the subject and
    /// channel under this link's node id. Its `Observer::id` must return
    /// [`SubjectLink::id`].
    #[must_use]
    pub fn new(observer: Weak<dyn Observer>) -> Self {
        Self {
            node: Dispatcher::new(),
            subject: RefCell::new(None),
            channel: RefCell::new(None),
            emits_updates: Cell::new(false),
            observer,
        }
    }

    #[must_use]
    pub fn node(&self) -> &Dispatcher {
        &self.node
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.node.id()
    }

    pub fn subject(&self) -> Option<Model<S>> {
        self.subject.borrow().clone()
    }

    pub fn channel(&self) -> Option<SubjectChannel<S>> {
        self.channel.borrow().clone()
    }

    /// The target accessors apply to. Single-level: the immediate subject.
    /// Chained access paths are a non-goal.
    pub fn target(&self) -> Option<Model<S>> {
        self.subject()
    }

    #[must_use]
    pub fn subject_emits_updates(&self) -> bool {
        self.emits_updates.get()
    }

    pub fn is_subject(&self, id: NodeId) -> bool {
        self.subject.borrow().as_ref().is_some_and(|s| s.id() == id)
    }

    pub fn is_channel(&self, id: NodeId) -> bool {
        self.channel.borrow().as_ref().is_some_and(|c| c.id() == id)
    }

    /// Point the adapter at a new subject. With a channel configured the
    /// swap goes through the channel and reaches this link (and every other
    /// sharing adapter) via the channel's notification.
    pub fn set_subject(&self, subject: Option<Model<S>>) -> Result<(), NotifyError> {
        let channel = self.channel.borrow().clone();
        match channel {
            Some(channel) => channel.set(subject),
            None => self.set_subject_locally(subject),
        }
    }

    fn set_subject_locally(&self, subject: Option<Model<S>>) -> Result<(), NotifyError> {
        self.unhook();
        *self.subject.borrow_mut() = subject;
        self.hookup();
        tracing::debug!(message = "adapter.subject_swap", node = ?self.node.id());
        self.node.emit(&Aspect::VALUE)
    }

    /// Construction-time subject store: no ceremony, nothing can be
    /// observing yet and hookup is off until the emits flag is raised.
    pub(crate) fn init_subject(&self, subject: Option<Model<S>>) {
        *self.subject.borrow_mut() = subject;
    }

    /// Swap the indirection channel and re-derive the subject from its
    /// value. Forces a refresh even when the effective subject is
    /// unchanged. With `None`, the link just detaches from the old channel
    /// and keeps its current subject.
    pub fn set_channel(&self, channel: Option<SubjectChannel<S>>) -> Result<(), NotifyError> {
        let previous = self.channel.borrow_mut().take();
        if let Some(previous) = previous {
            previous.delete_observer(self.node.id());
        }
        let Some(channel) = channel else {
            return Ok(());
        };
        if let Some(observer) = self.observer.upgrade() {
            channel.add_observer(&observer);
        }
        *self.channel.borrow_mut() = Some(channel);
        self.adopt_channel_subject()
    }

    /// Re-derive the subject from the channel's current value. This is the
    /// composing node's response to an update whose sender
    /// [`is_channel`](SubjectLink::is_channel).
    pub fn adopt_channel_subject(&self) -> Result<(), NotifyError> {
        let subject = match self.channel.borrow().as_ref() {
            Some(channel) => channel.get(),
            None => return Ok(()),
        };
        self.set_subject_locally(subject)
    }

    /// Toggle whether this adapter subscribes to its subject at all. The
    /// subscription is re-evaluated immediately: torn down under the old
    /// flag, re-established under the new one.
    pub fn set_subject_emits_updates(&self, emits: bool) {
        self.unhook();
        self.emits_updates.set(emits);
        self.hookup();
    }

    fn hookup(&self) {
        if !self.emits_updates.get() {
            return;
        }
        let subject = self.subject.borrow();
        if let Some(subject) = subject.as_ref() {
            if let Some(observer) = self.observer.upgrade() {
                subject.add_observer(&observer);
                tracing::debug!(
                    message = "adapter.hookup",
                    node = ?self.node.id(),
                    subject = ?subject.id()
                );
            }
        }
    }

    fn unhook(&self) {
        if !self.emits_updates.get() {
            return;
        }
        let subject = self.subject.borrow();
        if let Some(subject) = subject.as_ref() {
            subject.delete_observer(self.node.id());
            tracing::debug!(
                message = "adapter.unhook",
                node = ?self.node.id(),
                subject = ?subject.id()
            );
        }
    }

    /// Detach from subject and channel unconditionally, then drop all of
    /// the composing node's own observers. Idempotent.
    pub fn teardown(&self) {
        if let Some(subject) = self.subject.borrow().as_ref() {
            subject.delete_observer(self.node.id());
        }
        if let Some(channel) = self.channel.borrow().as_ref() {
            channel.delete_observer(self.node.id());
        }
        self.node.teardown();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
