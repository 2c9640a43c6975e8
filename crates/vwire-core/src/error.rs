#![forbid(unsafe_code)]

//! Error types for the propagation graph.
//!
//! Binding and invocation failures are surfaced to the caller as typed
//! errors, never logged-and-discarded. Observer callback failures are
//! isolated per observer and aggregated into a [`NotifyError`] so one
//! failing receiver cannot block delivery to the rest.

use std::error::Error;
use std::fmt;

use thiserror::Error;

use crate::observe::NodeId;

/// Failure reported by an observer's `update` callback.
pub type UpdateError = Box<dyn Error>;

/// Outcome of delivering a single update.
pub type UpdateResult = std::result::Result<(), UpdateError>;

pub type Result<T> = std::result::Result<T, WireError>;

/// Aggregated observer failures from one notify cycle.
///
/// Every registered observer was still invoked; this collects the ones that
/// returned an error, keyed by observer id.
#[derive(Debug)]
pub struct NotifyError {
    failures: Vec<(NodeId, UpdateError)>,
}

impl NotifyError {
    pub(crate) fn new(failures: Vec<(NodeId, UpdateError)>) -> Self {
        Self { failures }
    }

    #[must_use]
    pub fn failures(&self) -> &[(NodeId, UpdateError)] {
        &self.failures
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} observer update(s) failed during notify", self.failures.len())
    }
}

impl Error for NotifyError {}

/// Errors raised by the value surface: binding resolution, write
/// invocation, and missing-subject conditions.
#[derive(Debug, Error)]
pub enum WireError {
    /// A write was attempted with no subject configured. Reads in the same
    /// state return `None` instead.
    #[error("no subject configured")]
    NoSubject,

    /// No property is registered under the requested aspect name.
    #[error("no property `{aspect}` on {type_name}")]
    UnknownAspect {
        aspect: String,
        type_name: &'static str,
    },

    /// A property is registered under the aspect name, but with a
    /// different value type than requested.
    #[error("property `{aspect}` on {type_name} holds {stored}, requested {requested}")]
    AspectTypeMismatch {
        aspect: String,
        type_name: &'static str,
        stored: &'static str,
        requested: &'static str,
    },

    /// The subject's write accessor rejected the value.
    #[error("write to `{aspect}` rejected: {source}")]
    Rejected { aspect: String, source: UpdateError },

    /// Observer failures propagated out of a notify cycle.
    #[error(transparent)]
    Notify(#[from] NotifyError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_error_reports_failure_count() {
        let err = NotifyError::new(vec![
            (NodeId::next(), "boom".into()),
            (NodeId::next(), "bust".into()),
        ]);
        assert_eq!(err.len(), 2);
        assert_eq!(err.to_string(), "2 observer update(s) failed during notify");
    }

    #[test]
    fn wire_error_display() {
        let err = WireError::UnknownAspect {
            aspect: "name".into(),
            type_name: "Person",
        };
        assert_eq!(err.to_string(), "no property `name` on Person");

        let err = WireError::AspectTypeMismatch {
            aspect: "age".into(),
            type_name: "Person",
            stored: "u32",
            requested: "String",
        };
        assert_eq!(
            err.to_string(),
            "property `age` on Person holds u32, requested String"
        );
    }

    #[test]
    fn rejected_carries_cause() {
        let err = WireError::Rejected {
            aspect: "age".into(),
            source: "age out of range".into(),
        };
        assert_eq!(err.to_string(), "write to `age` rejected: age out of range");
    }
}
