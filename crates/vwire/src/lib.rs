#![forbid(unsafe_code)]

//! Valuewire public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub mod prelude {
    pub use vwire_adapter as adapter;
    pub use vwire_core as core;

    pub use vwire_adapter::{
        BufferedValue, Properties, Property, PropertyAdapter, PropertyTable, SubjectChannel,
        TriggerChannel,
    };
    pub use vwire_core::{
        Aspect, Model, NodeId, NotifyError, Observable, Observer, Value, ValueModel, ValueNode,
        WireError,
    };
}
