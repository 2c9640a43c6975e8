#![forbid(unsafe_code)]

//! Core change-propagation primitives: the observation contract,
//! edge-triggered dispatch, value containers, and observable domain state.

pub mod dispatch;
pub mod error;
pub mod model;
pub mod observe;
pub mod value;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testkit;

pub use dispatch::Dispatcher;
pub use error::{NotifyError, Result, UpdateError, UpdateResult, WireError};
pub use model::Model;
pub use observe::{Aspect, NodeId, Observable, Observer};
pub use value::{Value, ValueModel, ValueNode};
