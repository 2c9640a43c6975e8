#![forbid(unsafe_code)]

//! Property adapter: maps one named property of an observable domain model
//! onto the uniform value surface.
//!
//! The adapter is an observable toward its own observers and an observer
//! toward its subject and its indirection channel. Inbound subject updates
//! are filtered by aspect, which is what lets many adapters share one
//! subject and each react only to its own property.

use std::rc::{Rc, Weak};

use vwire_core::error::{NotifyError, UpdateResult, WireError};
use vwire_core::model::Model;
use vwire_core::observe::{Aspect, NodeId, Observable, Observer};
use vwire_core::value::ValueModel;

use crate::link::{SubjectChannel, SubjectLink};
use crate::property::{Properties, Property};

struct AdapterInner<S, V> {
    link: SubjectLink<S>,
    property: Property<S, V>,
    /// Inbound filter: subject updates are forwarded only when their aspect
    /// matches. `None` never forwards.
    aspect: Option<Aspect>,
}

impl<S: 'static, V: Clone + 'static> Observer for AdapterInner<S, V> {
    fn id(&self) -> NodeId {
        self.link.id()
    }

    fn update(&self, sender: NodeId, aspect: &Aspect) -> UpdateResult {
        if self.link.is_channel(sender) {
            self.link.adopt_channel_subject()?;
            return Ok(());
        }
        if self.link.is_subject(sender) && self.aspect.as_ref() == Some(aspect) {
            self.link.node().emit(aspect)?;
        }
        Ok(())
    }
}

/// Adapter binding one named property of a [`Model`] to the value surface.
///
/// Cloning the handle shares the same adapter node.
pub struct PropertyAdapter<S, V> {
    inner: Rc<AdapterInner<S, V>>,
}

impl<S, V> Clone for PropertyAdapter<S, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: 'static, V: Clone + 'static> PropertyAdapter<S, V> {
    /// Bind the property registered under `aspect` on the subject's type.
    ///
    /// Resolution is fixed for the adapter's lifetime. Fails when no such
    /// property exists or its value type is not `V`; a half-bound adapter
    /// is never returned.
    pub fn bind(subject: &Model<S>, aspect: &str) -> Result<Self, WireError>
    where
        S: Properties,
    {
        let property = S::properties().bind::<V>(aspect)?;
        let filter = Some(property.aspect().clone());
        Ok(Self::assemble(Some(subject.clone()), property, filter))
    }

    /// Use explicitly supplied accessors. `aspect` filters inbound subject
    /// updates; with `None` they are never forwarded.
    pub fn with_property(
        subject: &Model<S>,
        property: Property<S, V>,
        aspect: Option<Aspect>,
    ) -> Self {
        Self::assemble(Some(subject.clone()), property, aspect)
    }

    fn assemble(
        subject: Option<Model<S>>,
        property: Property<S, V>,
        aspect: Option<Aspect>,
    ) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<AdapterInner<S, V>>| {
            let observer: Weak<dyn Observer> = weak.clone();
            AdapterInner {
                link: SubjectLink::new(observer),
                property,
                aspect,
            }
        });
        inner.link.init_subject(subject);
        Self { inner }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.link.id()
    }

    pub fn subject(&self) -> Option<Model<S>> {
        self.inner.link.subject()
    }

    /// Repoint the adapter, directly or through its channel when one is
    /// configured.
    pub fn set_subject(&self, subject: Option<Model<S>>) -> Result<(), NotifyError> {
        self.inner.link.set_subject(subject)
    }

    pub fn channel(&self) -> Option<SubjectChannel<S>> {
        self.inner.link.channel()
    }

    pub fn set_channel(&self, channel: Option<SubjectChannel<S>>) -> Result<(), NotifyError> {
        self.inner.link.set_channel(channel)
    }

    #[must_use]
    pub fn subject_emits_updates(&self) -> bool {
        self.inner.link.subject_emits_updates()
    }

    pub fn set_subject_emits_updates(&self, emits: bool) {
        self.inner.link.set_subject_emits_updates(emits);
    }

    /// The object accessors apply to: the immediate subject (single-level
    /// resolution).
    pub fn target(&self) -> Option<Model<S>> {
        self.inner.link.target()
    }

    /// The inbound filter aspect, if any.
    #[must_use]
    pub fn aspect(&self) -> Option<&Aspect> {
        self.inner.aspect.as_ref()
    }

    /// This adapter as a registrable observer.
    #[must_use]
    pub fn as_observer(&self) -> Rc<dyn Observer> {
        self.inner.clone()
    }
}

impl<S: 'static, V: Clone + 'static> ValueModel<V> for PropertyAdapter<S, V> {
    /// `None` without a subject; otherwise the bound read accessor applied
    /// to the resolved target.
    fn get_value(&self) -> Option<V> {
        self.inner
            .link
            .target()
            .map(|subject| subject.with(|state| self.inner.property.read(state)))
    }

    /// Write through the bound accessor. The subject then announces the
    /// property's aspect; if this adapter is not subscribed to the subject,
    /// it raises a local `value` change instead, because nothing else will.
    fn set_value(&self, value: V) -> vwire_core::error::Result<()> {
        let inner = &self.inner;
        let Some(subject) = inner.link.target() else {
            return Err(WireError::NoSubject);
        };
        subject
            .with_mut(|state| inner.property.write(state, value))
            .map_err(|source| WireError::Rejected {
                aspect: inner.property.aspect().name().to_string(),
                source,
            })?;
        subject.raise(inner.property.aspect())?;
        if !inner.link.subject_emits_updates() {
            inner.link.node().emit(&Aspect::VALUE)?;
        }
        Ok(())
    }
}

impl<S: 'static, V: Clone + 'static> Observable for PropertyAdapter<S, V> {
    fn id(&self) -> NodeId {
        self.inner.link.id()
    }

    fn add_observer(&self, observer: &Rc<dyn Observer>) {
        self.inner.link.node().add_observer(observer);
    }

    fn delete_observer(&self, observer: NodeId) {
        self.inner.link.node().delete_observer(observer);
    }

    fn delete_all_observers(&self) {
        self.inner.link.node().delete_all_observers();
    }

    fn count_observers(&self) -> usize {
        self.inner.link.node().count_observers()
    }

    fn has_changed(&self) -> bool {
        self.inner.link.node().has_changed()
    }

    fn teardown(&self) {
        self.inner.link.teardown();
    }
}

impl<S: 'static, V> std::fmt::Debug for PropertyAdapter<S, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyAdapter")
            .field("id", &self.inner.link.id())
            .field("aspect", &self.inner.aspect)
            .field("has_subject", &self.inner.link.subject().is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
