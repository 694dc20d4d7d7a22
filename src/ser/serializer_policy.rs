//! How structs with named fields become [`Value`]s.
//!
//! [`Value`]: crate::value::Value

use std::collections::BTreeSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructStyle {
    /// Field values in declaration order, as a `Value::Tuple`. Fits a
    /// `(...)` signature.
    Tuple,
    /// Field name to field value, as a `Value::Map`. Fits `a{sv}` once
    /// each field value is wrapped for its variant slot.
    Map,
}

pub trait SerializerPolicy: Clone {
    fn struct_style(&self, name: &str) -> StructStyle;

    /// Whether map-style structs leave out fields whose value is unit
    /// or `None`.
    fn skip_empty_fields(&self) -> bool {
        true
    }
}

/// Every named struct becomes a map.
#[derive(Clone, Debug)]
pub struct DefaultSerializerPolicy;

impl SerializerPolicy for DefaultSerializerPolicy {
    fn struct_style(&self, _: &str) -> StructStyle {
        StructStyle::Map
    }
}

/// Every named struct becomes a tuple.
#[derive(Clone, Debug)]
pub struct StronglyTypedSerializerPolicy;

impl SerializerPolicy for StronglyTypedSerializerPolicy {
    fn struct_style(&self, _: &str) -> StructStyle {
        StructStyle::Tuple
    }
}

/// The listed structs become tuples, all others maps.
#[derive(Clone, Debug, Default)]
pub struct TupleStructsPolicy {
    names: BTreeSet<String>,
}

impl TupleStructsPolicy {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl SerializerPolicy for TupleStructsPolicy {
    fn struct_style(&self, name: &str) -> StructStyle {
        if self.names.contains(name) {
            StructStyle::Tuple
        } else {
            StructStyle::Map
        }
    }
}
