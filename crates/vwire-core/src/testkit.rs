#![forbid(unsafe_code)]

//! Test helpers: a recording observer for asserting on delivered updates.
//!
//! Compiled for this crate's own tests and, behind the `test-helpers`
//! feature, for downstream crates' test suites.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::UpdateResult;
use crate::observe::{Aspect, NodeId, Observer};

/// Observer that records every `(sender, aspect)` pair it receives.
///
/// Built with [`Probe::failing`], it also returns an error from each
/// `update`, for exercising failure aggregation.
pub struct Probe {
    id: NodeId,
    seen: RefCell<Vec<(NodeId, Aspect)>>,
    fail_message: Option<String>,
}

impl Probe {
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            id: NodeId::next(),
            seen: RefCell::new(Vec::new()),
            fail_message: None,
        })
    }

    /// A probe whose `update` records the delivery and then fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            id: NodeId::next(),
            seen: RefCell::new(Vec::new()),
            fail_message: Some(message.into()),
        })
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn as_observer(self: &Rc<Self>) -> Rc<dyn Observer> {
        self.clone()
    }

    /// Everything received so far, in delivery order.
    #[must_use]
    pub fn updates(&self) -> Vec<(NodeId, Aspect)> {
        self.seen.borrow().clone()
    }

    /// The aspects received so far, in delivery order.
    #[must_use]
    pub fn aspects(&self) -> Vec<Aspect> {
        self.seen.borrow().iter().map(|(_, a)| a.clone()).collect()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.seen.borrow().len()
    }

    pub fn clear(&self) {
        self.seen.borrow_mut().clear();
    }
}

impl Observer for Probe {
    fn id(&self) -> NodeId {
        self.id
    }

    fn update(&self, sender: NodeId, aspect: &Aspect) -> UpdateResult {
        self.seen.borrow_mut().push((sender, aspect.clone()));
        match &self.fail_message {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}
