#![forbid(unsafe_code)]

//! Subject adapters for valuewire: property binding, runtime subject
//! indirection, and write buffering behind a shared trigger channel.

pub mod adapter;
pub mod buffered;
pub mod link;
pub mod property;

pub use adapter::PropertyAdapter;
pub use buffered::{BufferedValue, TriggerChannel};
pub use link::{SubjectChannel, SubjectLink};
pub use property::{Properties, Property, PropertyTable, WriteResult};

#[cfg(test)]
mod fixtures;
