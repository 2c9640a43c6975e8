#![forbid(unsafe_code)]

//! Property binding: the accessor-resolution seam.
//!
//! # Design
//!
//! A domain type publishes named properties through [`Properties`]. An
//! adapter resolves one by aspect name at construction and keeps the
//! resolved accessor pair for its whole lifetime. Entries are stored
//! type-erased; agreement between the registered value type and the type
//! the adapter requests is validated exactly once, at bind time, and a
//! mismatch is a typed error rather than a latent call-site failure.
//!
//! # Failure Modes
//!
//! - **Unknown aspect**: no entry under the requested name. Yields
//!   [`WireError::UnknownAspect`]; construction fails.
//! - **Type mismatch**: an entry exists with a different value type. Yields
//!   [`WireError::AspectTypeMismatch`]; construction fails.
//! - **Rejected write**: a [`checked`](PropertyTable::checked) setter may
//!   refuse a value at call time; the rejection is surfaced to the writer.

use std::any::{Any, TypeId, type_name};
use std::marker::PhantomData;
use std::rc::Rc;

use ahash::AHashMap;

use vwire_core::error::{UpdateError, WireError};
use vwire_core::observe::Aspect;

/// Outcome of a property write: domain setters may reject a value.
pub type WriteResult = Result<(), UpdateError>;

/// A resolved read/write accessor pair for one named property of `S`.
///
/// Carries the aspect its subject raises when the property changes.
pub struct Property<S, V> {
    aspect: Aspect,
    read: Rc<dyn Fn(&S) -> V>,
    write: Rc<dyn Fn(&mut S, V) -> WriteResult>,
}

impl<S, V> core::fmt::Debug for Property<S, V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Property")
            .field("aspect", &self.aspect)
            .finish_non_exhaustive()
    }
}

impl<S, V> Clone for Property<S, V> {
    fn clone(&self) -> Self {
        Self {
            aspect: self.aspect.clone(),
            read: Rc::clone(&self.read),
            write: Rc::clone(&self.write),
        }
    }
}

impl<S: 'static, V: 'static> Property<S, V> {
    /// A property with infallible accessors.
    pub fn new(
        aspect: impl Into<Aspect>,
        read: impl Fn(&S) -> V + 'static,
        write: impl Fn(&mut S, V) + 'static,
    ) -> Self {
        Self {
            aspect: aspect.into(),
            read: Rc::new(read),
            write: Rc::new(move |state, value| {
                write(state, value);
                Ok(())
            }),
        }
    }

    /// A property whose setter can reject the value.
    pub fn checked(
        aspect: impl Into<Aspect>,
        read: impl Fn(&S) -> V + 'static,
        write: impl Fn(&mut S, V) -> WriteResult + 'static,
    ) -> Self {
        Self {
            aspect: aspect.into(),
            read: Rc::new(read),
            write: Rc::new(write),
        }
    }

    #[must_use]
    pub fn aspect(&self) -> &Aspect {
        &self.aspect
    }

    pub(crate) fn read(&self, state: &S) -> V {
        (self.read)(state)
    }

    pub(crate) fn write(&self, state: &mut S, value: V) -> WriteResult {
        (self.write)(state, value)
    }
}

struct Slot {
    value_type: &'static str,
    type_id: TypeId,
    property: Box<dyn Any>,
}

/// Named-property registry for a domain type.
pub struct PropertyTable<S> {
    entries: AHashMap<&'static str, Slot>,
    _marker: PhantomData<fn(&S)>,
}

impl<S: 'static> PropertyTable<S> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: AHashMap::new(),
            _marker: PhantomData,
        }
    }

    /// Register an infallible property under `aspect`.
    #[must_use]
    pub fn property<V: 'static>(
        self,
        aspect: &'static str,
        read: impl Fn(&S) -> V + 'static,
        write: impl Fn(&mut S, V) + 'static,
    ) -> Self {
        self.insert(aspect, Property::new(aspect, read, write))
    }

    /// Register a property whose setter can reject values.
    #[must_use]
    pub fn checked<V: 'static>(
        self,
        aspect: &'static str,
        read: impl Fn(&S) -> V + 'static,
        write: impl Fn(&mut S, V) -> WriteResult + 'static,
    ) -> Self {
        self.insert(aspect, Property::checked(aspect, read, write))
    }

    fn insert<V: 'static>(mut self, aspect: &'static str, property: Property<S, V>) -> Self {
        self.entries.insert(
            aspect,
            Slot {
                value_type: type_name::<V>(),
                type_id: TypeId::of::<V>(),
                property: Box::new(property),
            },
        );
        self
    }

    /// Resolve the property registered under `aspect` with value type `V`.
    pub fn bind<V: 'static>(&self, aspect: &str) -> Result<Property<S, V>, WireError> {
        let slot = self.entries.get(aspect).ok_or_else(|| WireError::UnknownAspect {
            aspect: aspect.to_string(),
            type_name: type_name::<S>(),
        })?;
        if slot.type_id != TypeId::of::<V>() {
            return Err(WireError::AspectTypeMismatch {
                aspect: aspect.to_string(),
                type_name: type_name::<S>(),
                stored: slot.value_type,
                requested: type_name::<V>(),
            });
        }
        let property = slot
            .property
            .downcast_ref::<Property<S, V>>()
            .expect("slot type id was just validated");
        Ok(property.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: 'static> Default for PropertyTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Domain types that publish named properties for adapter binding.
pub trait Properties: Sized + 'static {
    fn properties() -> PropertyTable<Self>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Person;

    #[test]
    fn bind_resolves_registered_property() {
        let table = Person::properties();
        let property = table.bind::<String>("name").unwrap();
        assert_eq!(property.aspect(), &Aspect::new("name"));

        let mut person = Person {
            name: "Ann".to_string(),
            age: 30,
        };
        assert_eq!(property.read(&person), "Ann");
        property.write(&mut person, "Bea".to_string()).unwrap();
        assert_eq!(person.name, "Bea");
    }

    #[test]
    fn unknown_aspect_fails_binding() {
        let err = Person::properties().bind::<String>("address").unwrap_err();
        assert!(matches!(err, WireError::UnknownAspect { .. }));
    }

    #[test]
    fn value_type_mismatch_fails_binding() {
        let err = Person::properties().bind::<String>("age").unwrap_err();
        match err {
            WireError::AspectTypeMismatch { stored, requested, .. } => {
                assert_eq!(stored, type_name::<u32>());
                assert_eq!(requested, type_name::<String>());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn checked_setter_rejects_out_of_range_values() {
        let property = Person::properties().bind::<u32>("age").unwrap();
        let mut person = Person {
            name: "Ann".to_string(),
            age: 30,
        };
        assert!(property.write(&mut person, 200).is_err());
        assert_eq!(person.age, 30);
        property.write(&mut person, 40).unwrap();
        assert_eq!(person.age, 40);
    }

    #[test]
    fn table_reports_size() {
        let table = Person::properties();
        assert_eq!(table.len(), 2);
        assert!(!table.is_empty());
        assert!(PropertyTable::<Person>::new().is_empty());
    }
}
