#![forbid(unsafe_code)]

//! Shared domain fixture for this crate's tests.

use vwire_core::model::Model;

use crate::property::{Properties, PropertyTable};

pub(crate) struct Person {
    pub name: String,
    pub age: u32,
}

impl Properties for Person {
    fn properties() -> PropertyTable<Self> {
        PropertyTable::new()
            .property("name", |p: &Self| p.name.clone(), |p, v| p.name = v)
            .checked(
                "age",
                |p: &Self| p.age,
                |p, v| {
                    if v > 150 {
                        return Err("age out of range".into());
                    }
                    p.age = v;
                    Ok(())
                },
            )
    }
}

pub(crate) fn person(name: &str, age: u32) -> Model<Person> {
    Model::new(Person {
        name: name.to_string(),
        age,
    })
}
