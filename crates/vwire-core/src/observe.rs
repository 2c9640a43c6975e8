#![forbid(unsafe_code)]

//! Observation contract: node identity, change aspects, and the
//! observer/observable capability pair.
//!
//! Every node in the propagation graph owns a [`NodeId`]. Updates carry the
//! sender's id rather than a reference, so a receiver distinguishes "my
//! subject" from "my indirection channel" by comparing ids against the
//! handles it already holds.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::UpdateResult;

/// Process-unique identity of a node in the propagation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh id.
    #[must_use]
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Names what changed in an update: a property name on a domain model, or
/// the generic [`Aspect::VALUE`] raised by value containers.
///
/// Cheap to clone; equality and hashing are by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Aspect(Cow<'static, str>);

impl Aspect {
    /// The "my value changed" aspect raised by value containers.
    pub const VALUE: Self = Self(Cow::Borrowed("value"));

    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Aspect {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for Aspect {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

/// Capability to receive change notifications.
///
/// An update may fail; failures are aggregated by the sender's notify cycle
/// without blocking delivery to other observers.
pub trait Observer {
    /// The receiver's node id, used for registry membership.
    fn id(&self) -> NodeId;

    /// Called once per notify cycle of a node this observer is registered
    /// with. `sender` is the notifying node's id.
    fn update(&self, sender: NodeId, aspect: &Aspect) -> UpdateResult;
}

/// Capability to be watched for changes.
///
/// Registration is idempotent and keyed by the observer's [`NodeId`]. The
/// registry holds observers weakly: dropping every strong handle to an
/// observer removes it from the graph without explicit deregistration.
pub trait Observable {
    fn id(&self) -> NodeId;

    /// Register `observer` unless an entry with the same id is present.
    fn add_observer(&self, observer: &Rc<dyn Observer>);

    /// Remove the registration with the given id, if any.
    fn delete_observer(&self, observer: NodeId);

    fn delete_all_observers(&self);

    /// Exact number of live registrations.
    fn count_observers(&self) -> usize;

    /// Read-only probe of the edge flag.
    fn has_changed(&self) -> bool;

    /// Release observers and any other held resources. Idempotent.
    fn teardown(&self);
}
