#![forbid(unsafe_code)]

//! Buffered value: caches writes until a shared trigger flushes them.
//!
//! # Design
//!
//! [`BufferedValue`] decorates a value node (typically a
//! [`PropertyAdapter`](crate::PropertyAdapter)) with a local cache slot and
//! a shared boolean trigger channel. Writes land in the slot; flipping the
//! trigger to `true` pushes the slot to the subject, flipping it to `false`
//! discards the slot. Several buffered values sharing one trigger commit or
//! revert together.
//!
//! # Invariants
//!
//! 1. A vacant read delegates to the subject and never populates the slot.
//! 2. An assigned read returns the slot without touching the subject.
//! 3. The slot empties on discard, on subject replacement, and after a
//!    successful flush; a failed flush keeps it.
//! 4. Subject changes are forwarded only while the slot is vacant; an
//!    assigned slot masks them.
//! 5. Subscribed to the subject iff at least one own observer is
//!    registered; this is the one node whose lazy hookup keys off its own
//!    observer count.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use vwire_core::dispatch::Dispatcher;
use vwire_core::error::{NotifyError, UpdateError, UpdateResult, WireError};
use vwire_core::observe::{Aspect, NodeId, Observable, Observer};
use vwire_core::value::{Value, ValueModel, ValueNode};

/// Trigger channel payload: `true` flushes the cache to the subject,
/// `false` discards it.
pub type TriggerChannel = Value<bool>;

/// Cache slot: keeps "nothing buffered" distinct from every legal payload.
enum Slot<T> {
    Vacant,
    Assigned(T),
}

struct BufferedInner<T> {
    node: Dispatcher,
    slot: RefCell<Slot<T>>,
    subject: RefCell<Option<Rc<dyn ValueNode<T>>>>,
    trigger: RefCell<Option<TriggerChannel>>,
    weak_self: Weak<BufferedInner<T>>,
}

impl<T: Clone + 'static> BufferedInner<T> {
    fn hooked(&self) -> bool {
        self.node.count_observers() > 0
    }

    fn hook_subject(&self) {
        let subject = self.subject.borrow();
        if let Some(subject) = subject.as_ref() {
            if let Some(inner) = self.weak_self.upgrade() {
                let observer: Rc<dyn Observer> = inner;
                subject.add_observer(&observer);
            }
        }
    }

    fn unhook_subject(&self) {
        let subject = self.subject.borrow();
        if let Some(subject) = subject.as_ref() {
            subject.delete_observer(self.node.id());
        }
    }

    /// Trigger transition. Flush pushes an assigned slot to the subject
    /// with the subject subscription dropped for the duration, so the echo
    /// of our own write is not forwarded. Discard empties the slot and
    /// announces a value change so dependents re-fetch.
    fn changed_trigger(&self) -> UpdateResult {
        let flush = self
            .trigger
            .borrow()
            .as_ref()
            .is_some_and(|trigger| trigger.get());
        if flush {
            let value = {
                let slot = self.slot.borrow();
                match &*slot {
                    Slot::Vacant => return Ok(()),
                    Slot::Assigned(value) => value.clone(),
                }
            };
            let subject = self.subject.borrow().clone();
            let Some(subject) = subject else {
                return Ok(());
            };
            let was_hooked = self.hooked();
            if was_hooked {
                subject.delete_observer(self.node.id());
            }
            tracing::debug!(message = "buffered.flush", node = ?self.node.id());
            let result = subject.set_value(value);
            if result.is_ok() {
                *self.slot.borrow_mut() = Slot::Vacant;
            }
            if was_hooked {
                if let Some(inner) = self.weak_self.upgrade() {
                    let observer: Rc<dyn Observer> = inner;
                    subject.add_observer(&observer);
                }
            }
            result.map_err(UpdateError::from)
        } else {
            tracing::debug!(message = "buffered.discard", node = ?self.node.id());
            *self.slot.borrow_mut() = Slot::Vacant;
            self.node.emit(&Aspect::VALUE).map_err(UpdateError::from)
        }
    }
}

impl<T: Clone + 'static> Observer for BufferedInner<T> {
    fn id(&self) -> NodeId {
        self.node.id()
    }

    fn update(&self, sender: NodeId, aspect: &Aspect) -> UpdateResult {
        let is_trigger = self
            .trigger
            .borrow()
            .as_ref()
            .is_some_and(|trigger| trigger.id() == sender);
        if is_trigger {
            return self.changed_trigger();
        }
        let is_subject = self
            .subject
            .borrow()
            .as_ref()
            .is_some_and(|subject| subject.id() == sender);
        let vacant = matches!(*self.slot.borrow(), Slot::Vacant);
        if is_subject && vacant {
            // The value we read through has changed underneath us.
            self.node.emit(aspect)?;
        }
        // An assigned slot masks subject changes: the buffered value wins.
        Ok(())
    }
}

/// Write-buffering decorator over a value node, controlled by a shared
/// boolean trigger channel.
///
/// Cloning the handle shares the same node.
pub struct BufferedValue<T> {
    inner: Rc<BufferedInner<T>>,
}

impl<T> Clone for BufferedValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> BufferedValue<T> {
    pub fn new(subject: Rc<dyn ValueNode<T>>, trigger: &TriggerChannel) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<BufferedInner<T>>| BufferedInner {
            node: Dispatcher::new(),
            slot: RefCell::new(Slot::Vacant),
            subject: RefCell::new(None),
            trigger: RefCell::new(None),
            weak_self: weak.clone(),
        });
        let buffered = Self { inner };
        *buffered.inner.subject.borrow_mut() = Some(subject);
        buffered.set_trigger(Some(trigger.clone()));
        buffered
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.node.id()
    }

    pub fn subject(&self) -> Option<Rc<dyn ValueNode<T>>> {
        self.inner.subject.borrow().clone()
    }

    /// Replace the subject. The slot resets: whatever was buffered belonged
    /// to the old subject.
    pub fn set_subject(&self, subject: Option<Rc<dyn ValueNode<T>>>) -> Result<(), NotifyError> {
        let observed = self.inner.hooked();
        if observed {
            self.inner.unhook_subject();
        }
        *self.inner.subject.borrow_mut() = subject;
        *self.inner.slot.borrow_mut() = Slot::Vacant;
        if observed {
            self.inner.hook_subject();
        }
        self.inner.node.emit(&Aspect::VALUE)
    }

    pub fn trigger(&self) -> Option<TriggerChannel> {
        self.inner.trigger.borrow().clone()
    }

    /// Attach to a trigger channel, detaching from any previous one. The
    /// trigger subscription is unconditional; only the subject subscription
    /// is keyed off this node's observer count.
    pub fn set_trigger(&self, trigger: Option<TriggerChannel>) {
        let previous = self.inner.trigger.borrow_mut().take();
        if let Some(previous) = previous {
            previous.delete_observer(self.inner.node.id());
        }
        if let Some(trigger) = trigger {
            let observer: Rc<dyn Observer> = self.inner.clone();
            trigger.add_observer(&observer);
            *self.inner.trigger.borrow_mut() = Some(trigger);
        }
    }

    /// Buffer `value` and announce the change. The subject is untouched
    /// until the trigger flushes.
    pub fn set(&self, value: T) -> Result<(), NotifyError> {
        *self.inner.slot.borrow_mut() = Slot::Assigned(value);
        self.inner.node.emit(&Aspect::VALUE)
    }

    /// The buffered value if one is assigned, otherwise a read-through to
    /// the subject (which does not populate the slot).
    #[must_use]
    pub fn get(&self) -> Option<T> {
        {
            let slot = self.inner.slot.borrow();
            if let Slot::Assigned(value) = &*slot {
                return Some(value.clone());
            }
        }
        self.inner
            .subject
            .borrow()
            .as_ref()
            .and_then(|subject| subject.get_value())
    }

    /// This buffered value as a registrable observer.
    #[must_use]
    pub fn as_observer(&self) -> Rc<dyn Observer> {
        self.inner.clone()
    }
}

impl<T: Clone + 'static> Observable for BufferedValue<T> {
    fn id(&self) -> NodeId {
        self.inner.node.id()
    }

    /// First registration establishes the subject subscription.
    fn add_observer(&self, observer: &Rc<dyn Observer>) {
        if self.inner.node.count_observers() == 0 {
            self.inner.hook_subject();
        }
        self.inner.node.add_observer(observer);
    }

    /// Removing the last registration tears the subject subscription down.
    fn delete_observer(&self, observer: NodeId) {
        self.inner.node.delete_observer(observer);
        if self.inner.node.count_observers() == 0 {
            self.inner.unhook_subject();
        }
    }

    fn delete_all_observers(&self) {
        self.inner.node.delete_all_observers();
        self.inner.unhook_subject();
    }

    fn count_observers(&self) -> usize {
        self.inner.node.count_observers()
    }

    fn has_changed(&self) -> bool {
        self.inner.node.has_changed()
    }

    fn teardown(&self) {
        if let Some(trigger) = self.inner.trigger.borrow().as_ref() {
            trigger.delete_observer(self.inner.node.id());
        }
        self.inner.unhook_subject();
        self.inner.node.teardown();
    }
}

impl<T: Clone + 'static> ValueModel<T> for BufferedValue<T> {
    fn get_value(&self) -> Option<T> {
        self.get()
    }

    fn set_value(&self, value: T) -> vwire_core::error::Result<()> {
        self.set(value).map_err(WireError::from)
    }
}

impl<T> fmt::Debug for BufferedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let assigned = matches!(*self.inner.slot.borrow(), Slot::Assigned(_));
        f.debug_struct("BufferedValue")
            .field("id", &self.inner.node.id())
            .field("assigned", &assigned)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use vwire_core::testkit::Probe;

    use super::*;

    fn setup() -> (Value<i32>, TriggerChannel, BufferedValue<i32>) {
        let subject = Value::new(1);
        let trigger: TriggerChannel = Value::new(false);
        let buffered = BufferedValue::new(Rc::new(subject.clone()), &trigger);
        (subject, trigger, buffered)
    }

    #[test]
    fn buffered_write_does_not_touch_the_subject() {
        let (subject, _trigger, buffered) = setup();

        buffered.set(5).unwrap();

        assert_eq!(buffered.get(), Some(5));
        assert_eq!(subject.get(), 1);
    }

    #[test]
    fn vacant_reads_delegate_without_populating() {
        let (subject, _trigger, buffered) = setup();

        assert_eq!(buffered.get(), Some(1));
        subject.set(2).unwrap();
        // Still reading through: the slot was never populated by a read.
        assert_eq!(buffered.get(), Some(2));
    }

    #[test]
    fn flush_pushes_the_buffered_value() {
        let (subject, trigger, buffered) = setup();
        buffered.set(5).unwrap();

        trigger.set(true).unwrap();

        assert_eq!(subject.get(), 5);
        // Slot is vacant again: reads go straight through.
        subject.set(7).unwrap();
        assert_eq!(buffered.get(), Some(7));
    }

    #[test]
    fn flush_with_vacant_slot_is_a_noop() {
        let (subject, trigger, buffered) = setup();
        let probe = Probe::new();
        buffered.add_observer(&probe.as_observer());

        trigger.set(true).unwrap();

        assert_eq!(subject.get(), 1);
        assert_eq!(probe.count(), 0);
    }

    #[test]
    fn discard_empties_the_slot_and_notifies() {
        let (_subject, trigger, buffered) = setup();
        let probe = Probe::new();
        buffered.add_observer(&probe.as_observer());
        buffered.set(5).unwrap();
        probe.clear();

        trigger.set(false).unwrap();

        assert_eq!(probe.aspects(), vec![Aspect::VALUE]);
        assert_eq!(buffered.get(), Some(1));
    }

    #[test]
    fn subject_subscription_follows_own_observer_count() {
        let (subject, _trigger, buffered) = setup();
        assert_eq!(subject.count_observers(), 0);

        let probe = Probe::new();
        buffered.add_observer(&probe.as_observer());
        assert_eq!(subject.count_observers(), 1);

        let second = Probe::new();
        buffered.add_observer(&second.as_observer());
        assert_eq!(subject.count_observers(), 1);

        buffered.delete_observer(probe.id());
        assert_eq!(subject.count_observers(), 1);

        buffered.delete_observer(second.id());
        assert_eq!(subject.count_observers(), 0);
    }

    #[test]
    fn subject_change_forwards_while_vacant_and_is_masked_while_assigned() {
        let (subject, _trigger, buffered) = setup();
        let probe = Probe::new();
        buffered.add_observer(&probe.as_observer());

        subject.set(3).unwrap();
        assert_eq!(probe.aspects(), vec![Aspect::VALUE]);

        buffered.set(9).unwrap();
        probe.clear();
        subject.set(4).unwrap();

        // The buffered value wins: the subject's change was masked.
        assert_eq!(probe.count(), 0);
        assert_eq!(buffered.get(), Some(9));
    }

    #[test]
    fn flush_does_not_forward_the_echo_of_its_own_write() {
        let (subject, trigger, buffered) = setup();
        let probe = Probe::new();
        buffered.add_observer(&probe.as_observer());
        buffered.set(5).unwrap();
        probe.clear();

        trigger.set(true).unwrap();
        assert_eq!(probe.count(), 0);

        // Re-subscribed after the flush: later subject changes forward.
        subject.set(6).unwrap();
        assert_eq!(probe.aspects(), vec![Aspect::VALUE]);
    }

    #[test]
    fn replacing_the_subject_resets_the_slot() {
        let (_subject, _trigger, buffered) = setup();
        let probe = Probe::new();
        buffered.add_observer(&probe.as_observer());
        buffered.set(5).unwrap();
        probe.clear();

        let replacement = Value::new(100);
        buffered
            .set_subject(Some(Rc::new(replacement.clone())))
            .unwrap();

        assert_eq!(buffered.get(), Some(100));
        assert_eq!(probe.aspects(), vec![Aspect::VALUE]);
        assert_eq!(replacement.count_observers(), 1);
    }

    #[test]
    fn trigger_subscription_is_unconditional() {
        let (_subject, trigger, buffered) = setup();
        assert_eq!(trigger.count_observers(), 1);

        buffered.set_trigger(None);
        assert_eq!(trigger.count_observers(), 0);
    }

    #[test]
    fn teardown_detaches_and_is_idempotent() {
        let (subject, trigger, buffered) = setup();
        let probe = Probe::new();
        buffered.add_observer(&probe.as_observer());

        buffered.teardown();
        buffered.teardown();

        assert_eq!(subject.count_observers(), 0);
        assert_eq!(trigger.count_observers(), 0);
        assert_eq!(buffered.count_observers(), 0);
    }
}
